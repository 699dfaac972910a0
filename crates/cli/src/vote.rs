// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Vote submission and Stop-on-Match reconciliation.
//!
//! The server alone decides when a room matches. This client records what
//! the server asserts, through vote responses and pushed or polled events,
//! and refuses further votes once a room is matched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use mm_core::{EventPayload, RoomVoteState, Topic, TopicEvent, Vote};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::query::{QueryError, QueryLayer, VoteInput};
use crate::sync::{SubscriptionHandle, SyncClient};

pub use mm_core::Transition as Reconciled;

type VoteKey = (String, String, String);

/// Error type for vote operations.
#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    /// The room already has a result; no vote was sent.
    #[error("room {room_id} already matched on {movie_id}")]
    AlreadyMatched { room_id: String, movie_id: String },

    /// The same vote was already submitted; no vote was sent.
    #[error("{user_id} already voted for {movie_id} in room {room_id}")]
    DuplicateVote {
        room_id: String,
        movie_id: String,
        user_id: String,
    },

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Result of a vote or refresh: the reconciled state and what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub state: RoomVoteState,
    pub transition: Reconciled,
}

/// Tracks local room vote state and submits votes.
pub struct VoteClient {
    query: Arc<dyn QueryLayer>,
    rooms: Mutex<HashMap<String, RoomVoteState>>,
    pending: Mutex<HashSet<VoteKey>>,
    votes: Mutex<Vec<Vote>>,
}

/// Releases a duplicate-suppression key unless the vote was accepted.
struct Reservation<'a> {
    pending: &'a Mutex<HashSet<VoteKey>>,
    key: Option<VoteKey>,
}

impl Reservation<'_> {
    fn commit(mut self) {
        self.key = None;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.pending.lock().remove(&key);
        }
    }
}

impl VoteClient {
    pub fn new(query: Arc<dyn QueryLayer>) -> Self {
        VoteClient {
            query,
            rooms: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashSet::new()),
            votes: Mutex::new(Vec::new()),
        }
    }

    /// Submit a vote for `movie_id` in `room_id`.
    ///
    /// Fails without a network call when the room is already matched or
    /// the same vote was already accepted. A failed query leaves no record
    /// of the vote, so it may be retried.
    pub async fn submit_vote(
        &self,
        room_id: &str,
        movie_id: &str,
        user_id: &str,
    ) -> Result<VoteOutcome, VoteError> {
        if let Some(result) = self.matched_result(room_id) {
            return Err(VoteError::AlreadyMatched {
                room_id: room_id.to_string(),
                movie_id: result,
            });
        }

        let key = (room_id.to_string(), user_id.to_string(), movie_id.to_string());
        if !self.pending.lock().insert(key.clone()) {
            return Err(VoteError::DuplicateVote {
                room_id: room_id.to_string(),
                movie_id: movie_id.to_string(),
                user_id: user_id.to_string(),
            });
        }
        let reservation = Reservation {
            pending: &self.pending,
            key: Some(key),
        };

        let input = VoteInput {
            room_id: room_id.to_string(),
            movie_id: movie_id.to_string(),
            user_id: user_id.to_string(),
        };
        debug!(room = room_id, movie = movie_id, user = user_id, "submitting vote");
        let response = self.query.vote(&input).await?;
        reservation.commit();

        self.votes
            .lock()
            .push(Vote::new(room_id, user_id, movie_id, Utc::now()));

        let (transition, state) = self.with_room(room_id, |state| {
            state.apply_vote_response(&response, movie_id)
        });
        if let Reconciled::Matched { movie_id } = &transition {
            info!(room = room_id, movie = %movie_id, source = "vote", "room matched");
        }
        Ok(VoteOutcome { state, transition })
    }

    /// Reconcile a live or polled event into local state.
    pub fn apply_event(&self, event: &TopicEvent) -> Reconciled {
        self.reconcile(event).0
    }

    /// Fetch the room and reconcile it into local state.
    pub async fn refresh_room(&self, room_id: &str) -> Result<VoteOutcome, VoteError> {
        let room = self.query.get_room(room_id).await?;
        let (transition, state) = self.with_room(room_id, |state| state.apply_room(&room));
        if let Reconciled::Matched { movie_id } = &transition {
            info!(room = room_id, movie = %movie_id, source = "refresh", "room matched");
        }
        Ok(VoteOutcome { state, transition })
    }

    pub fn room_state(&self, room_id: &str) -> Option<RoomVoteState> {
        self.rooms.lock().get(room_id).cloned()
    }

    /// Votes accepted by the server for `room_id`, oldest first.
    pub fn votes_cast(&self, room_id: &str) -> Vec<Vote> {
        self.votes
            .lock()
            .iter()
            .filter(|v| v.room_id == room_id)
            .cloned()
            .collect()
    }

    /// Subscribe all topics of `room_id` and feed them into this client.
    ///
    /// `on_change` runs for every update while the room is active and once
    /// for the match, whichever source reports it first.
    pub fn watch_room<F>(self: &Arc<Self>, sync: &SyncClient, room_id: &str, on_change: F) -> RoomWatch
    where
        F: Fn(&RoomVoteState, &Reconciled) + Send + Sync + 'static,
    {
        let on_change = Arc::new(on_change);
        let handles = Topic::all_for_room(room_id)
            .into_iter()
            .map(|topic| {
                let client = Arc::clone(self);
                let on_change = Arc::clone(&on_change);
                sync.subscribe(topic, move |event| {
                    let (transition, state) = client.reconcile(event);
                    if matches!(transition, Reconciled::Updated | Reconciled::Matched { .. }) {
                        on_change(&state, &transition);
                    }
                })
            })
            .collect();
        RoomWatch { handles }
    }

    fn reconcile(&self, event: &TopicEvent) -> (Reconciled, RoomVoteState) {
        let room_id = event.topic.room_id.as_str();
        let (transition, state) = self.with_room(room_id, |state| match &event.payload {
            EventPayload::VoteUpdate(update) => state.apply_vote_update(update),
            EventPayload::MatchFound(found) => state.apply_match(&found.movie_id),
            EventPayload::RoomUpdate(room) => state.apply_room(room),
        });
        match &transition {
            Reconciled::Matched { movie_id } => {
                info!(room = room_id, movie = %movie_id, source = ?event.source, "room matched");
            }
            Reconciled::Discarded => {
                debug!(room = room_id, topic = %event.topic, "discarded event for matched room");
            }
            _ => {}
        }
        (transition, state)
    }

    fn matched_result(&self, room_id: &str) -> Option<String> {
        self.rooms
            .lock()
            .get(room_id)
            .filter(|s| s.is_matched())
            .and_then(|s| s.result_movie_id.clone())
    }

    fn with_room(
        &self,
        room_id: &str,
        f: impl FnOnce(&mut RoomVoteState) -> Reconciled,
    ) -> (Reconciled, RoomVoteState) {
        let mut rooms = self.rooms.lock();
        let state = rooms
            .entry(room_id.to_string())
            .or_insert_with(|| RoomVoteState::new(room_id));
        let transition = f(state);
        (transition, state.clone())
    }
}

/// Subscriptions created by [`VoteClient::watch_room`].
#[derive(Debug, Clone)]
pub struct RoomWatch {
    handles: Vec<SubscriptionHandle>,
}

impl RoomWatch {
    /// Cancel every topic of the watch. Idempotent.
    pub fn cancel(&self) {
        for handle in &self.handles {
            handle.cancel();
        }
    }

    pub fn handles(&self) -> &[SubscriptionHandle] {
        &self.handles
    }
}

#[cfg(test)]
#[path = "vote_tests.rs"]
mod tests;
