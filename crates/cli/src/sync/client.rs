// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronization client façade.
//!
//! Provides a high-level interface for:
//! - Subscribing callbacks to room topics over the shared gateway connection
//! - Automatic reconnection with exponential backoff
//! - Fallback polling once reconnection is exhausted
//! - Forcing reconnection when the network comes back

use std::sync::Arc;

use mm_core::{Topic, TopicEvent};

use super::backoff::BackoffPolicy;
use super::connection::ConnectionConfig;
use super::controller::{self, Control, Shared};
use super::poller::{room_poll_fn, FallbackPoller, PollIntervals};
use super::pool::ConnectionPool;
use super::registry::{
    Registration, Registry, SubscriptionHandle, SubscriptionInfo, SubscriptionState,
};
use super::transport::{websocket_connector, Connector};
use crate::credentials::CredentialProvider;
use crate::query::QueryLayer;

/// Configuration for the sync client.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Gateway connection settings.
    pub connection: ConnectionConfig,
    /// Reconnection attempts before a topic falls back to polling.
    pub max_attempts: u32,
    /// Delay between reconnection attempts.
    pub backoff: BackoffPolicy,
    /// Fallback poll intervals.
    pub poll: PollIntervals,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            connection: ConnectionConfig::default(),
            max_attempts: 5,
            backoff: BackoffPolicy::default(),
            poll: PollIntervals::default(),
        }
    }
}

/// Real-time subscription client.
///
/// Cheap to clone; clones share subscriptions and the gateway connection.
/// Methods that start work spawn tokio tasks and must be called inside a
/// runtime.
#[derive(Clone)]
pub struct SyncClient {
    shared: Arc<Shared>,
    query: Arc<dyn QueryLayer>,
}

impl SyncClient {
    /// Create a client that connects over WebSocket.
    pub fn new(
        config: SyncConfig,
        credentials: Arc<dyn CredentialProvider>,
        query: Arc<dyn QueryLayer>,
    ) -> Self {
        Self::with_connector(config, credentials, query, websocket_connector())
    }

    /// Create a client with a custom transport factory (for testing).
    pub fn with_connector(
        config: SyncConfig,
        credentials: Arc<dyn CredentialProvider>,
        query: Arc<dyn QueryLayer>,
        connector: Connector,
    ) -> Self {
        let registry = Arc::new(Registry::new());
        let pool = ConnectionPool::new(
            config.connection,
            connector,
            credentials,
            Arc::clone(&registry) as _,
        );
        let shared = Arc::new(Shared {
            poller: FallbackPoller::new(Arc::clone(&registry)),
            registry,
            pool,
            poll_fn: room_poll_fn(Arc::clone(&query)),
            backoff: config.backoff,
            max_attempts: config.max_attempts,
            intervals: config.poll,
        });
        SyncClient { shared, query }
    }

    /// Subscribe `callback` to `topic`.
    ///
    /// Subscribing to a topic that is already active returns a handle to the
    /// existing subscription and keeps its original callback.
    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> SubscriptionHandle
    where
        F: Fn(&TopicEvent) + Send + Sync + 'static,
    {
        let registry = &self.shared.registry;
        match registry.register(&topic, Arc::new(callback)) {
            Registration::Existing(token) => SubscriptionHandle::new(topic, token, registry),
            Registration::New {
                token,
                control,
                cancel,
            } => {
                tokio::spawn(controller::run_topic(
                    Arc::clone(&self.shared),
                    topic.clone(),
                    token,
                    control,
                    cancel,
                ));
                SubscriptionHandle::new(topic, token, registry)
            }
        }
    }

    /// Cancel every subscription. Returns how many were active.
    pub fn unsubscribe_all(&self) -> usize {
        self.shared.registry.unregister_all()
    }

    /// Retry `topic` immediately with a fresh attempt budget.
    pub fn force_reconnect(&self, topic: &Topic) -> bool {
        self.shared.registry.signal(topic, Control::ForceReconnect)
    }

    #[cfg(test)]
    pub(crate) fn signal(&self, topic: &Topic, control: Control) -> bool {
        self.shared.registry.signal(topic, control)
    }

    /// [`force_reconnect`](Self::force_reconnect) every topic.
    pub fn force_reconnect_all(&self) -> usize {
        self.shared.registry.signal_all(|| Control::ForceReconnect)
    }

    /// Snapshot of every subscription.
    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        self.shared.registry.snapshot()
    }

    pub fn state(&self, topic: &Topic) -> Option<SubscriptionState> {
        self.shared.registry.state(topic)
    }

    /// Whether `topic` is currently served by the fallback poller.
    pub fn is_polling(&self, topic: &Topic) -> bool {
        self.shared.poller.is_polling(topic)
    }

    /// Id of the shared gateway connection while it is open.
    pub fn connection_id(&self) -> Option<u64> {
        self.shared.pool.connection_id()
    }

    pub fn query(&self) -> &Arc<dyn QueryLayer> {
        &self.query
    }

    /// Cancel every subscription and close the gateway connection.
    pub async fn shutdown(&self) {
        self.unsubscribe_all();
        self.shared.pool.close_all().await;
    }
}
