// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Logical event streams.
//!
//! A [`Topic`] names one stream of server-pushed events for one room. Its
//! wire id doubles as the correlation id in `start`/`stop`/`data` frames.
//!
//! Format: `{kind}:{room_id}` (e.g. `vote_update:r1`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Kind of event a topic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A member voted; carries running vote counts.
    VoteUpdate,
    /// The server recorded a unanimous choice for the room.
    MatchFound,
    /// Room metadata or membership changed.
    RoomUpdate,
}

impl EventKind {
    /// All kinds, in the order a room watch subscribes them.
    pub const ALL: [EventKind; 3] = [
        EventKind::MatchFound,
        EventKind::VoteUpdate,
        EventKind::RoomUpdate,
    ];

    /// Returns the string representation used in wire ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::VoteUpdate => "vote_update",
            EventKind::MatchFound => "match_found",
            EventKind::RoomUpdate => "room_update",
        }
    }

    /// The GraphQL subscription field whose value a data frame carries.
    pub fn field_name(&self) -> &'static str {
        match self {
            EventKind::VoteUpdate => "onVoteUpdate",
            EventKind::MatchFound => "onMatchFound",
            EventKind::RoomUpdate => "onRoomUpdate",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "vote_update" | "vote" | "votes" => Ok(EventKind::VoteUpdate),
            "match_found" | "match" => Ok(EventKind::MatchFound),
            "room_update" | "room" => Ok(EventKind::RoomUpdate),
            _ => Err(Error::InvalidEventKind(s.to_string())),
        }
    }
}

/// One logical event stream: an event kind scoped to a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Topic {
    pub kind: EventKind,
    pub room_id: String,
}

impl Topic {
    pub fn new(kind: EventKind, room_id: impl Into<String>) -> Self {
        Topic {
            kind,
            room_id: room_id.into(),
        }
    }

    pub fn vote_update(room_id: impl Into<String>) -> Self {
        Topic::new(EventKind::VoteUpdate, room_id)
    }

    pub fn match_found(room_id: impl Into<String>) -> Self {
        Topic::new(EventKind::MatchFound, room_id)
    }

    pub fn room_update(room_id: impl Into<String>) -> Self {
        Topic::new(EventKind::RoomUpdate, room_id)
    }

    /// All topics for a room.
    pub fn all_for_room(room_id: &str) -> Vec<Topic> {
        EventKind::ALL
            .iter()
            .map(|kind| Topic::new(*kind, room_id))
            .collect()
    }

    /// Correlation id used in wire frames.
    pub fn wire_id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.room_id)
    }
}

impl FromStr for Topic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Room ids may themselves contain ':', so only the first one separates.
        let (kind, room_id) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidTopic(s.to_string()))?;
        if room_id.is_empty() {
            return Err(Error::InvalidTopic(s.to_string()));
        }
        let kind = kind
            .parse::<EventKind>()
            .map_err(|_| Error::InvalidTopic(s.to_string()))?;
        Ok(Topic::new(kind, room_id))
    }
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
