// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typed events delivered to subscription callbacks.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::room::{MatchFound, Room, VoteUpdate};
use crate::topic::{EventKind, Topic};

/// Decoded payload of one event, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum EventPayload {
    VoteUpdate(VoteUpdate),
    MatchFound(MatchFound),
    RoomUpdate(Room),
}

impl EventPayload {
    /// Decodes the `data` object of a data frame for a topic of `kind`.
    ///
    /// The object must carry the kind's subscription field with a non-null value.
    pub fn decode(kind: EventKind, data: &serde_json::Value) -> Result<Self> {
        let field = kind.field_name();
        let value = data
            .get(field)
            .filter(|v| !v.is_null())
            .ok_or_else(|| Error::Validation(format!("missing {} in data payload", field)))?
            .clone();
        let payload = match kind {
            EventKind::VoteUpdate => EventPayload::VoteUpdate(serde_json::from_value(value)?),
            EventKind::MatchFound => EventPayload::MatchFound(serde_json::from_value(value)?),
            EventKind::RoomUpdate => EventPayload::RoomUpdate(serde_json::from_value(value)?),
        };
        Ok(payload)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::VoteUpdate(_) => EventKind::VoteUpdate,
            EventPayload::MatchFound(_) => EventKind::MatchFound,
            EventPayload::RoomUpdate(_) => EventKind::RoomUpdate,
        }
    }

    pub fn room_id(&self) -> &str {
        match self {
            EventPayload::VoteUpdate(update) => &update.room_id,
            EventPayload::MatchFound(found) => &found.room_id,
            EventPayload::RoomUpdate(room) => &room.id,
        }
    }
}

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Pushed over the live connection.
    Live,
    /// Synthesized by the fallback poller.
    Poll,
}

/// An event routed to a topic's callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEvent {
    pub topic: Topic,
    pub payload: EventPayload,
    pub source: EventSource,
}

impl TopicEvent {
    pub fn live(topic: Topic, payload: EventPayload) -> Self {
        TopicEvent {
            topic,
            payload,
            source: EventSource::Live,
        }
    }

    pub fn polled(topic: Topic, payload: EventPayload) -> Self {
        TopicEvent {
            topic,
            payload,
            source: EventSource::Poll,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
