// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fallback polling for topics whose live channel has failed.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use mm_core::{EventKind, EventPayload, MatchFound, Room, RoomStatus, Topic, TopicEvent};
use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::Registry;
use crate::query::{QueryError, QueryLayer};

/// Future returned by a [`PollFn`].
pub type PollFuture = Pin<Box<dyn Future<Output = Result<Option<EventPayload>, QueryError>> + Send>>;

/// Fetches the current value behind a topic. `None` means nothing to report.
pub type PollFn = Arc<dyn Fn(Topic) -> PollFuture + Send + Sync>;

/// Poll interval per event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub room: Duration,
    pub vote: Duration,
    pub match_found: Duration,
}

impl PollIntervals {
    pub fn for_kind(&self, kind: EventKind) -> Duration {
        match kind {
            EventKind::RoomUpdate => self.room,
            EventKind::VoteUpdate => self.vote,
            EventKind::MatchFound => self.match_found,
        }
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        PollIntervals {
            room: Duration::from_secs(5),
            vote: Duration::from_secs(5),
            match_found: Duration::from_secs(3),
        }
    }
}

/// Map a polled room onto what a topic of `kind` would have pushed.
///
/// Match topics only report once the room is matched.
pub fn poll_payload(kind: EventKind, room: Room) -> Option<EventPayload> {
    match kind {
        EventKind::RoomUpdate | EventKind::VoteUpdate => Some(EventPayload::RoomUpdate(room)),
        EventKind::MatchFound => match (room.status, room.result_movie_id) {
            (RoomStatus::Matched, Some(movie_id)) => Some(EventPayload::MatchFound(MatchFound {
                room_id: room.id,
                movie_id,
                matched_at: None,
            })),
            _ => None,
        },
    }
}

/// A [`PollFn`] backed by `getRoom`.
pub fn room_poll_fn(query: Arc<dyn QueryLayer>) -> PollFn {
    Arc::new(move |topic: Topic| -> PollFuture {
        let query = Arc::clone(&query);
        Box::pin(async move {
            let room = query.get_room(&topic.room_id).await?;
            Ok(poll_payload(topic.kind, room))
        })
    })
}

/// Runs one polling task per failed topic.
pub struct FallbackPoller {
    registry: Arc<Registry>,
    tasks: Mutex<HashMap<Topic, CancellationToken>>,
}

impl FallbackPoller {
    /// Shortest interval a topic is polled at.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

    pub fn new(registry: Arc<Registry>) -> Self {
        FallbackPoller {
            registry,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Start polling `topic` every `interval`, first poll immediately.
    ///
    /// Polling ends on [`stop`](Self::stop) or when `parent` is cancelled.
    /// Intervals below [`MIN_INTERVAL`](Self::MIN_INTERVAL) are raised to it.
    pub fn start(&self, topic: &Topic, poll_fn: PollFn, interval: Duration, parent: &CancellationToken) {
        let interval = interval.max(Self::MIN_INTERVAL);
        let token = parent.child_token();
        if let Some(previous) = self.tasks.lock().insert(topic.clone(), token.clone()) {
            previous.cancel();
        }
        info!(topic = %topic, interval_ms = interval.as_millis() as u64, "fallback polling started");

        let registry = Arc::clone(&self.registry);
        let topic = topic.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<EventPayload> = None;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let result = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    result = poll_fn(topic.clone()) => result,
                };

                match result {
                    Ok(Some(payload)) if last.as_ref() != Some(&payload) => {
                        last = Some(payload.clone());
                        if token.is_cancelled() {
                            break;
                        }
                        debug!(event = "message", topic = %topic, "polled value changed");
                        registry.route(&TopicEvent::polled(topic.clone(), payload));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(event = "error", topic = %topic, reason = %e, "poll failed");
                    }
                }
            }

            debug!(topic = %topic, "fallback polling stopped");
        });
    }

    /// Stop polling `topic`. Idempotent.
    pub fn stop(&self, topic: &Topic) -> bool {
        match self.tasks.lock().remove(topic) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_polling(&self, topic: &Topic) -> bool {
        self.tasks
            .lock()
            .get(topic)
            .is_some_and(|t| !t.is_cancelled())
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
