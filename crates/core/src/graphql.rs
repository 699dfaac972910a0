// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! GraphQL subscription documents, one per event kind.

use serde::{Deserialize, Serialize};

use crate::topic::{EventKind, Topic};

const ON_VOTE_UPDATE: &str = "subscription OnVoteUpdate($roomId: ID!) { \
onVoteUpdate(roomId: $roomId) { roomId movieId userId currentVotes totalMembers status resultMovieId } }";

const ON_MATCH_FOUND: &str = "subscription OnMatchFound($roomId: ID!) { \
onMatchFound(roomId: $roomId) { roomId movieId matchedAt } }";

const ON_ROOM_UPDATE: &str = "subscription OnRoomUpdate($roomId: ID!) { \
onRoomUpdate(roomId: $roomId) { id name status resultMovieId memberIds totalMembers createdAt } }";

/// A GraphQL request body: document plus variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphqlRequest {
    pub query: String,
    #[serde(default)]
    pub variables: serde_json::Value,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>, variables: serde_json::Value) -> Self {
        GraphqlRequest {
            query: query.into(),
            variables,
        }
    }

    /// The subscription request for a topic.
    pub fn subscription(topic: &Topic) -> Self {
        GraphqlRequest::new(
            subscription_document(topic.kind),
            serde_json::json!({ "roomId": topic.room_id }),
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// The subscription document for an event kind.
pub fn subscription_document(kind: EventKind) -> &'static str {
    match kind {
        EventKind::VoteUpdate => ON_VOTE_UPDATE,
        EventKind::MatchFound => ON_MATCH_FOUND,
        EventKind::RoomUpdate => ON_ROOM_UPDATE,
    }
}

#[cfg(test)]
#[path = "graphql_tests.rs"]
mod tests;
