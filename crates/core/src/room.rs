// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Room, vote, and movie records plus the local vote-state machine.
//!
//! [`RoomVoteState`] enforces Stop-on-Match: once a room is `Matched` its
//! result is frozen and every later mutation is discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Voting status of a room as asserted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    /// Votes are still being collected.
    #[serde(alias = "active")]
    Active,
    /// Every member accepted the same movie. Terminal.
    #[serde(alias = "matched")]
    Matched,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Active => "ACTIVE",
            RoomStatus::Matched => "MATCHED",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(RoomStatus::Active),
            "MATCHED" => Ok(RoomStatus::Matched),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// A room as returned by `getRoom` and pushed on `room_update` topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: RoomStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_movie_id: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub total_members: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Movie metadata from `getMovieDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

/// Payload of a `vote_update` push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteUpdate {
    pub room_id: String,
    pub movie_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub current_votes: u32,
    pub total_members: u32,
    #[serde(default = "default_status")]
    pub status: RoomStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_movie_id: Option<String>,
}

fn default_status() -> RoomStatus {
    RoomStatus::Active
}

/// Payload of a `match_found` push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFound {
    pub room_id: String,
    pub movie_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_at: Option<DateTime<Utc>>,
}

/// Response of the `vote` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub room_id: String,
    pub status: RoomStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_movie_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_votes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_members: Option<u32>,
}

/// A recorded vote. Append-only; at most one per (room, user, movie).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub room_id: String,
    pub user_id: String,
    pub movie_id: String,
    pub timestamp: DateTime<Utc>,
}

impl Vote {
    pub fn new(
        room_id: impl Into<String>,
        user_id: impl Into<String>,
        movie_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Vote {
            room_id: room_id.into(),
            user_id: user_id.into(),
            movie_id: movie_id.into(),
            timestamp,
        }
    }

    /// Key used for duplicate suppression.
    pub fn key(&self) -> (String, String, String) {
        (
            self.room_id.clone(),
            self.user_id.clone(),
            self.movie_id.clone(),
        )
    }
}

/// Running tally for one movie in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub current_votes: u32,
    pub total_members: u32,
}

/// Outcome of feeding a server assertion into a [`RoomVoteState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing observable changed.
    Unchanged,
    /// Tallies or membership changed; the room is still active.
    Updated,
    /// The room just became matched. Reported once per room.
    Matched { movie_id: String },
    /// A second report of the match already recorded.
    ConfirmedMatch,
    /// The room is matched; the mutation was dropped.
    Discarded,
}

/// Local view of a room's voting outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomVoteState {
    pub room_id: String,
    pub status: RoomStatus,
    pub result_movie_id: Option<String>,
    #[serde(default)]
    pub total_members: Option<u32>,
    #[serde(default)]
    pub tallies: BTreeMap<String, Tally>,
}

impl RoomVoteState {
    pub fn new(room_id: impl Into<String>) -> Self {
        RoomVoteState {
            room_id: room_id.into(),
            status: RoomStatus::Active,
            result_movie_id: None,
            total_members: None,
            tallies: BTreeMap::new(),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.status == RoomStatus::Matched
    }

    /// Records a match. First caller wins; later calls confirm or are discarded.
    pub fn apply_match(&mut self, movie_id: &str) -> Transition {
        match self.result_movie_id.as_deref() {
            Some(existing) if existing == movie_id => Transition::ConfirmedMatch,
            Some(_) => Transition::Discarded,
            None => {
                self.status = RoomStatus::Matched;
                self.result_movie_id = Some(movie_id.to_string());
                Transition::Matched {
                    movie_id: movie_id.to_string(),
                }
            }
        }
    }

    pub fn apply_vote_update(&mut self, update: &VoteUpdate) -> Transition {
        if self.is_matched() {
            return match (update.status, update.result_movie_id.as_deref()) {
                (RoomStatus::Matched, Some(movie)) => self.apply_match(movie),
                _ => Transition::Discarded,
            };
        }
        let tally = Tally {
            current_votes: update.current_votes,
            total_members: update.total_members,
        };
        let changed = self.tallies.get(&update.movie_id) != Some(&tally)
            || self.total_members != Some(update.total_members);
        self.tallies.insert(update.movie_id.clone(), tally);
        self.total_members = Some(update.total_members);

        match (update.status, update.result_movie_id.as_deref()) {
            (RoomStatus::Matched, Some(movie)) => self.apply_match(movie),
            (RoomStatus::Matched, None) => self.apply_match(&update.movie_id),
            (RoomStatus::Active, _) if changed => Transition::Updated,
            (RoomStatus::Active, _) => Transition::Unchanged,
        }
    }

    pub fn apply_room(&mut self, room: &Room) -> Transition {
        match (room.status, room.result_movie_id.as_deref()) {
            (RoomStatus::Matched, Some(movie)) => self.apply_match(movie),
            // A matched room without a result is malformed; keep what we have.
            (RoomStatus::Matched, None) => Transition::Discarded,
            (RoomStatus::Active, _) if self.is_matched() => Transition::Discarded,
            (RoomStatus::Active, _) => {
                if self.total_members == Some(room.total_members) {
                    Transition::Unchanged
                } else {
                    self.total_members = Some(room.total_members);
                    Transition::Updated
                }
            }
        }
    }

    /// Applies a `vote` response for a vote cast on `voted_movie`.
    pub fn apply_vote_response(&mut self, response: &VoteResponse, voted_movie: &str) -> Transition {
        match response.status {
            RoomStatus::Matched => {
                let movie = response.result_movie_id.as_deref().unwrap_or(voted_movie);
                self.apply_match(movie)
            }
            RoomStatus::Active if self.is_matched() => Transition::Discarded,
            RoomStatus::Active => match (response.current_votes, response.total_members) {
                (Some(current_votes), Some(total_members)) => {
                    self.apply_vote_update(&VoteUpdate {
                        room_id: response.room_id.clone(),
                        movie_id: voted_movie.to_string(),
                        user_id: None,
                        current_votes,
                        total_members,
                        status: RoomStatus::Active,
                        result_movie_id: None,
                    })
                }
                _ => Transition::Unchanged,
            },
        }
    }
}

#[cfg(test)]
#[path = "room_tests.rs"]
mod tests;
