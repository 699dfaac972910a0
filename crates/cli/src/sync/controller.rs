// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-topic reconnection state machine.
//!
//! One task drives each registered topic through
//! `Connecting -> Open -> {Reconnecting -> Open | Failed}`. The task loops
//! rather than recursing; failure signals that arrive while a retry is
//! pending are absorbed by the wait in progress.

use std::sync::Arc;
use std::time::Duration;

use mm_core::{GraphqlRequest, Topic};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backoff::BackoffPolicy;
use super::connection::ConnectionError;
use super::poller::{FallbackPoller, PollFn, PollIntervals};
use super::pool::ConnectionPool;
use super::registry::{Registry, SubscriptionState, SubscriptionToken};

/// Messages delivered to a topic's controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// The gateway ended the topic's stream on connection `connection_id`.
    TopicLost { connection_id: u64, reason: String },
    /// Retry now with a fresh attempt budget.
    ForceReconnect,
}

/// Classified failures of the sync layer. Logged, never returned to subscribers.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("{topic}: gave up after {attempts} reconnection attempts")]
    MaxReconnectAttemptsExceeded { topic: Topic, attempts: u32 },

    #[error("validation error: {0}")]
    Validation(#[from] mm_core::Error),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Everything a controller task needs, shared by all topics of a client.
pub(crate) struct Shared {
    pub registry: Arc<Registry>,
    pub pool: ConnectionPool,
    pub poller: FallbackPoller,
    pub poll_fn: PollFn,
    pub backoff: BackoffPolicy,
    pub max_attempts: u32,
    pub intervals: PollIntervals,
}

/// Outcome of waiting between attempts.
enum Wake {
    Retry,
    Reset,
    Stop,
}

/// Drive `topic` until its subscription is cancelled.
pub(crate) async fn run_topic(
    shared: Arc<Shared>,
    topic: Topic,
    token: SubscriptionToken,
    mut control: mpsc::UnboundedReceiver<Control>,
    cancel: CancellationToken,
) {
    let request = GraphqlRequest::subscription(&topic);
    let mut attempt: u32 = 0;
    let mut established = false;

    'outer: loop {
        let result = shared.pool.start_topic(&topic, &request, &cancel).await;
        if cancel.is_cancelled() {
            if let Ok(conn) = &result {
                shared.pool.release(conn, &topic).await;
            }
            break;
        }

        let reason = match result {
            Ok(conn) => {
                if established {
                    info!(event = "reconnect", topic = %topic, connection = conn.id(), attempt, "topic re-established");
                } else {
                    debug!(topic = %topic, connection = conn.id(), "topic started");
                }
                established = true;
                attempt = 0;
                shared
                    .registry
                    .set_state(&topic, token, SubscriptionState::Open, 0);
                shared.registry.set_connection(&topic, token, Some(conn.id()));

                let reason = loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            shared.pool.release(&conn, &topic).await;
                            break 'outer;
                        }
                        closure = conn.closed() => break closure.reason,
                        msg = control.recv() => match msg {
                            Some(Control::TopicLost { connection_id, reason }) if connection_id == conn.id() => {
                                shared.pool.release(&conn, &topic).await;
                                break reason;
                            }
                            Some(Control::TopicLost { .. }) | Some(Control::ForceReconnect) => {}
                            None => {
                                shared.pool.release(&conn, &topic).await;
                                break 'outer;
                            }
                        },
                    }
                };
                shared.registry.set_connection(&topic, token, None);
                reason
            }
            Err(e) => SyncError::from(e).to_string(),
        };

        warn!(event = "disconnect", topic = %topic, reason = %reason, attempt, "live channel lost");

        if attempt < shared.max_attempts {
            attempt += 1;
            shared
                .registry
                .set_state(&topic, token, SubscriptionState::Reconnecting, attempt);
            let delay = shared.backoff.delay(attempt - 1);
            debug!(topic = %topic, attempt, delay_ms = delay.as_millis() as u64, "reconnecting after backoff");
            match wait_backoff(delay, &cancel, &mut control).await {
                Wake::Retry => {}
                Wake::Reset => attempt = 0,
                Wake::Stop => break,
            }
        } else {
            let err = SyncError::MaxReconnectAttemptsExceeded {
                topic: topic.clone(),
                attempts: attempt,
            };
            warn!(event = "error", topic = %topic, reason = %err, attempt, "falling back to polling");
            shared
                .registry
                .set_state(&topic, token, SubscriptionState::Failed, attempt);
            shared.poller.start(
                &topic,
                Arc::clone(&shared.poll_fn),
                shared.intervals.for_kind(topic.kind),
                &cancel,
            );

            let wake = wait_failed(&cancel, &mut control).await;
            shared.poller.stop(&topic);
            match wake {
                Wake::Reset => {
                    info!(topic = %topic, "forced reconnect from fallback");
                    attempt = 0;
                    shared
                        .registry
                        .set_state(&topic, token, SubscriptionState::Reconnecting, 0);
                }
                Wake::Retry | Wake::Stop => break,
            }
        }
    }

    shared.poller.stop(&topic);
    debug!(topic = %topic, "controller stopped");
}

/// Sleep out a backoff delay, absorbing further loss signals.
async fn wait_backoff(
    delay: Duration,
    cancel: &CancellationToken,
    control: &mut mpsc::UnboundedReceiver<Control>,
) -> Wake {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Wake::Stop,
            _ = &mut sleep => return Wake::Retry,
            msg = control.recv() => match msg {
                Some(Control::ForceReconnect) => return Wake::Reset,
                Some(Control::TopicLost { .. }) => {}
                None => return Wake::Stop,
            },
        }
    }
}

/// Park a failed topic until it is forced back or cancelled.
async fn wait_failed(
    cancel: &CancellationToken,
    control: &mut mpsc::UnboundedReceiver<Control>,
) -> Wake {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Wake::Stop,
            msg = control.recv() => match msg {
                Some(Control::ForceReconnect) => return Wake::Reset,
                Some(Control::TopicLost { .. }) => {}
                None => return Wake::Stop,
            },
        }
    }
}
