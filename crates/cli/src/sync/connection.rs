// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One gateway connection multiplexing many topics.
//!
//! [`Connection::open`] connects the transport and performs the handshake;
//! on success a background task owns the transport, writes queued control
//! frames, reads server frames, and hands data frames to a [`FrameSink`].
//! Keep-alive frames only reset the dead-connection watchdog.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mm_core::graphql::GraphqlRequest;
use mm_core::protocol::{ClientFrame, DataPayload, ServerFrame};
use mm_core::Topic;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::transport::{Transport, TransportError};

/// Connection state values for the atomic state field.
pub const STATE_CONNECTING: u8 = 0;
pub const STATE_OPEN: u8 = 1;
pub const STATE_CLOSED: u8 = 2;

/// Close code used when the client ends the connection.
const NORMAL_CLOSURE: u16 = 1000;

/// Configuration for gateway connections.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// URL of the realtime gateway.
    pub url: String,
    /// Max time to wait for `connection_ack`, including the socket connect.
    pub handshake_timeout: Duration,
    /// Dead-connection window used when the ack does not carry one.
    pub keepalive_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            url: "ws://localhost:7890/graphql/realtime".to_string(),
            handshake_timeout: Duration::from_secs(10),
            keepalive_timeout: Duration::from_secs(300),
        }
    }
}

/// Error type for connection establishment and control.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("gateway rejected connection: {0}")]
    Rejected(String),

    #[error("no credential available for handshake")]
    MissingCredential,

    #[error("connection attempt cancelled")]
    Cancelled,

    #[error("connection closed")]
    Closed,
}

/// Observable state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closure {
    pub code: Option<u16>,
    pub clean: bool,
    pub reason: String,
}

impl Closure {
    fn clean(code: Option<u16>, reason: impl Into<String>) -> Self {
        Closure {
            code,
            clean: true,
            reason: reason.into(),
        }
    }

    fn unclean(reason: impl Into<String>) -> Self {
        Closure {
            code: None,
            clean: false,
            reason: reason.into(),
        }
    }
}

/// Receiver of inbound topic traffic.
pub trait FrameSink: Send + Sync {
    /// A data frame arrived for `topic_id`.
    fn on_data(&self, connection_id: u64, topic_id: &str, payload: DataPayload);

    /// The gateway ended `topic_id`'s stream (`complete` or `error`).
    fn on_topic_closed(&self, connection_id: u64, topic_id: &str, reason: String);
}

/// A live, handshaken gateway connection.
pub struct Connection {
    id: u64,
    state: AtomicU8,
    outbound: mpsc::UnboundedSender<ClientFrame>,
    topics: Mutex<HashSet<Topic>>,
    shutdown: CancellationToken,
    closed: CancellationToken,
    closure: Mutex<Option<Closure>>,
}

impl Connection {
    /// Connect `transport` and complete the handshake.
    ///
    /// Cancelling `cancel` aborts the attempt and disconnects the transport.
    pub async fn open(
        id: u64,
        mut transport: Box<dyn Transport>,
        config: &ConnectionConfig,
        credential: String,
        sink: Arc<dyn FrameSink>,
        cancel: &CancellationToken,
    ) -> Result<Arc<Connection>, ConnectionError> {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let conn = Arc::new(Connection {
            id,
            state: AtomicU8::new(STATE_CONNECTING),
            outbound,
            topics: Mutex::new(HashSet::new()),
            shutdown: CancellationToken::new(),
            closed: CancellationToken::new(),
            closure: Mutex::new(None),
        });

        debug!(connection = id, url = %config.url, "opening gateway connection");

        let timeout = config.handshake_timeout;
        let handshake = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ConnectionError::Cancelled),
            result = tokio::time::timeout(
                timeout,
                perform_handshake(transport.as_mut(), &config.url, credential),
            ) => result.unwrap_or_else(|_| Err(ConnectionError::HandshakeTimeout(timeout))),
        };

        let ack_window = match handshake {
            Ok(window) => window,
            Err(e) => {
                let _ = transport.disconnect().await;
                conn.finish(Closure::unclean(e.to_string()));
                return Err(e);
            }
        };

        let keepalive = ack_window
            .map(Duration::from_millis)
            .unwrap_or(config.keepalive_timeout);
        conn.state.store(STATE_OPEN, Ordering::Release);

        tokio::spawn(run_io(
            Arc::clone(&conn),
            transport,
            outbound_rx,
            sink,
            keepalive,
        ));

        Ok(conn)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        match self.state.load(Ordering::Acquire) {
            STATE_CONNECTING => ConnectionState::Connecting,
            STATE_OPEN => ConnectionState::Open,
            _ => ConnectionState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Queue a `start` frame for `topic`. Data frames follow asynchronously.
    pub fn start_topic(&self, topic: &Topic, request: &GraphqlRequest) -> Result<(), ConnectionError> {
        if !self.is_open() {
            return Err(ConnectionError::Closed);
        }
        let frame = ClientFrame::start(topic, request)
            .map_err(|e| TransportError::SerializationError(e.to_string()))?;
        self.topics.lock().insert(topic.clone());
        self.outbound
            .send(frame)
            .map_err(|_| ConnectionError::Closed)
    }

    /// Queue a `stop` frame for `topic`.
    ///
    /// Returns whether a frame was queued; stopping on a closed connection
    /// only forgets the topic.
    pub fn stop_topic(&self, topic: &Topic) -> bool {
        let known = self.topics.lock().remove(topic);
        known && self.is_open() && self.outbound.send(ClientFrame::stop(topic)).is_ok()
    }

    pub fn topic_count(&self) -> usize {
        self.topics.lock().len()
    }

    pub fn has_topic(&self, topic: &Topic) -> bool {
        self.topics.lock().contains(topic)
    }

    /// Terminate the connection. Idempotent.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    /// Wait until the connection has closed, for any reason.
    pub async fn closed(&self) -> Closure {
        self.closed.cancelled().await;
        self.closure()
            .unwrap_or_else(|| Closure::unclean("connection closed"))
    }

    /// How the connection ended, once it has.
    pub fn closure(&self) -> Option<Closure> {
        self.closure.lock().clone()
    }

    fn finish(&self, closure: Closure) {
        self.state.store(STATE_CLOSED, Ordering::Release);
        {
            let mut slot = self.closure.lock();
            if slot.is_none() {
                *slot = Some(closure.clone());
            }
        }
        if !self.closed.is_cancelled() {
            info!(
                event = "disconnect",
                connection = self.id,
                code = ?closure.code,
                clean = closure.clean,
                reason = %closure.reason,
                "gateway connection closed"
            );
        }
        self.closed.cancel();
    }

    /// Handle one server frame. Returns a closure when the frame ends the connection.
    fn dispatch(&self, frame: ServerFrame, sink: &dyn FrameSink) -> Option<Closure> {
        match frame {
            ServerFrame::Ka | ServerFrame::ConnectionAck { .. } => None,
            ServerFrame::StartAck { id } => {
                debug!(connection = self.id, topic = %id, "topic started");
                None
            }
            ServerFrame::Data { id, payload } => {
                sink.on_data(self.id, &id, payload);
                None
            }
            ServerFrame::Complete { id } => {
                sink.on_topic_closed(self.id, &id, "completed by gateway".to_string());
                None
            }
            ServerFrame::Error {
                id: Some(id),
                payload,
            } => {
                sink.on_topic_closed(self.id, &id, payload.to_string());
                None
            }
            ServerFrame::Error { id: None, payload } => {
                warn!(event = "error", connection = self.id, error = %payload, "gateway error");
                None
            }
            ServerFrame::ConnectionError { payload } => Some(Closure::unclean(format!(
                "gateway connection error: {}",
                payload
            ))),
        }
    }
}

/// Connect, send `connection_init`, and wait for `connection_ack`.
///
/// Returns the keep-alive window advertised by the ack, if any.
async fn perform_handshake(
    transport: &mut dyn Transport,
    url: &str,
    credential: String,
) -> Result<Option<u64>, ConnectionError> {
    transport.connect(url).await?;
    transport
        .send(ClientFrame::connection_init(credential))
        .await?;

    loop {
        match transport.recv().await {
            Ok(Some(ServerFrame::ConnectionAck { payload })) => {
                return Ok(payload.and_then(|p| p.connection_timeout_ms));
            }
            Ok(Some(ServerFrame::ConnectionError { payload })) => {
                return Err(ConnectionError::Rejected(payload.to_string()));
            }
            Ok(Some(ServerFrame::Ka)) => continue,
            Ok(Some(other)) => {
                debug!(frame = ?other, "ignoring frame before acknowledgement");
            }
            Ok(None) => return Err(TransportError::ConnectionClosed.into()),
            Err(TransportError::SerializationError(e)) => {
                warn!(event = "error", error = %e, "dropping malformed frame during handshake");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Background task owning the transport of an open connection.
async fn run_io(
    conn: Arc<Connection>,
    mut transport: Box<dyn Transport>,
    mut outbound: mpsc::UnboundedReceiver<ClientFrame>,
    sink: Arc<dyn FrameSink>,
    keepalive: Duration,
) {
    let mut deadline = Instant::now() + keepalive;

    let closure = loop {
        tokio::select! {
            biased;

            _ = conn.shutdown.cancelled() => {
                // Flush stop frames queued just before the close.
                while let Ok(frame) = outbound.try_recv() {
                    if transport.send(frame).await.is_err() {
                        break;
                    }
                }
                let _ = transport.disconnect().await;
                break Closure::clean(Some(NORMAL_CLOSURE), "closed by client");
            }

            Some(frame) = outbound.recv() => {
                if let Err(e) = transport.send(frame).await {
                    let _ = transport.disconnect().await;
                    break Closure::unclean(e.to_string());
                }
            }

            _ = tokio::time::sleep_until(deadline) => {
                let _ = transport.disconnect().await;
                break Closure::unclean(format!("no keep-alive within {:?}", keepalive));
            }

            received = transport.recv() => {
                deadline = Instant::now() + keepalive;
                match received {
                    Ok(Some(frame)) => {
                        if let Some(closure) = conn.dispatch(frame, sink.as_ref()) {
                            let _ = transport.disconnect().await;
                            break closure;
                        }
                    }
                    Ok(None) => {
                        break Closure::clean(transport.close_code(), "closed by gateway");
                    }
                    Err(TransportError::SerializationError(e)) => {
                        warn!(
                            event = "error",
                            connection = conn.id,
                            error = %e,
                            "dropping malformed frame"
                        );
                    }
                    Err(e) => break Closure::unclean(e.to_string()),
                }
            }
        }
    };

    conn.finish(closure);
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
