// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! mm-core: Shared library for the moviematch sync client
//!
//! This crate provides the data model (topics, rooms, votes), the gateway
//! wire protocol, and the subscription documents used by the `mmsync`
//! client library and the `mm` CLI.

pub mod error;
pub mod event;
pub mod graphql;
pub mod protocol;
pub mod room;
pub mod topic;

pub use error::{Error, Result};
pub use event::{EventPayload, EventSource, TopicEvent};
pub use graphql::GraphqlRequest;
pub use protocol::{ClientFrame, ServerFrame};
pub use room::{
    MatchFound, Movie, Room, RoomStatus, RoomVoteState, Tally, Transition, Vote, VoteResponse,
    VoteUpdate,
};
pub use topic::{EventKind, Topic};
