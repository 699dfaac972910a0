// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time sync module for room event subscriptions.
//!
//! Provides the WebSocket client that keeps room topics live against the
//! realtime gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ SyncClient  │────►│  Registry   │◄────│ Connection  │◄────│  Transport  │
//! │  (façade)   │     │ (per topic) │     │   (pool)    │     │   (trait)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   ▲
//!        ▼                   │
//! ┌─────────────┐     ┌─────────────┐
//! │ Controller  │────►│   Poller    │  (after reconnection is exhausted)
//! │ (per topic) │     │ (fallback)  │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Features
//!
//! - One gateway connection multiplexed across all topics
//! - Automatic reconnect with exponential backoff, per topic
//! - Fallback polling through the query layer
//! - No delivery after a subscription is cancelled
//! - Injectable transport trait for testing

mod backoff;
mod client;
mod connection;
mod controller;
mod poller;
mod pool;
mod registry;
mod transport;

pub use backoff::BackoffPolicy;
pub use client::{SyncClient, SyncConfig};
pub use connection::{Closure, ConnectionConfig, ConnectionError, ConnectionState};
pub use controller::SyncError;
pub use poller::{poll_payload, PollIntervals};
pub use registry::{SubscriptionHandle, SubscriptionInfo, SubscriptionState, SubscriptionToken};
pub use transport::{
    websocket_connector, Connector, Transport, TransportError, TransportResult, WebSocketTransport,
    SUBPROTOCOL,
};

#[cfg(test)]
pub(crate) mod test_helpers;
