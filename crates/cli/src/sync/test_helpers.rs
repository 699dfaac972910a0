// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mm_core::protocol::{ClientFrame, ServerFrame};
use tokio::sync::mpsc;

use super::transport::{Connector, Transport, TransportError, TransportResult};

/// What a mock link feeds to the transport's `recv`.
enum Incoming {
    Frame(ServerFrame),
    Malformed(String),
    Close,
    Fail,
}

/// Scripted gateway handing out [`MockTransport`]s.
#[derive(Clone)]
pub struct MockGateway {
    inner: Arc<GatewayState>,
}

struct GatewayState {
    links: Mutex<Vec<MockLink>>,
    refuse_next: AtomicU32,
    refuse_all: AtomicBool,
    auto_ack: AtomicBool,
    ack_window: Mutex<Option<u64>>,
    connect_attempts: AtomicU32,
}

impl MockGateway {
    /// A gateway that accepts connections and acks every handshake.
    pub fn new() -> Self {
        MockGateway {
            inner: Arc::new(GatewayState {
                links: Mutex::new(Vec::new()),
                refuse_next: AtomicU32::new(0),
                refuse_all: AtomicBool::new(false),
                auto_ack: AtomicBool::new(true),
                ack_window: Mutex::new(None),
                connect_attempts: AtomicU32::new(0),
            }),
        }
    }

    pub fn connector(&self) -> Connector {
        let inner = Arc::clone(&self.inner);
        Arc::new(move || {
            Box::new(MockTransport {
                gateway: Arc::clone(&inner),
                link: None,
            }) as Box<dyn Transport>
        })
    }

    /// Whether handshakes are acked automatically.
    pub fn set_auto_ack(&self, ack: bool) {
        self.inner.auto_ack.store(ack, Ordering::SeqCst);
    }

    /// Keep-alive window advertised in automatic acks.
    pub fn set_ack_window(&self, ms: Option<u64>) {
        *self.inner.ack_window.lock().unwrap() = ms;
    }

    /// Refuse the next `n` connects.
    pub fn refuse_next(&self, n: u32) {
        self.inner.refuse_next.store(n, Ordering::SeqCst);
    }

    /// Refuse every connect until turned off.
    pub fn refuse_all(&self, refuse: bool) {
        self.inner.refuse_all.store(refuse, Ordering::SeqCst);
    }

    pub fn connect_attempts(&self) -> u32 {
        self.inner.connect_attempts.load(Ordering::SeqCst)
    }

    /// Links of every successful connect, oldest first.
    pub fn links(&self) -> Vec<MockLink> {
        self.inner.links.lock().unwrap().clone()
    }

    pub fn latest(&self) -> MockLink {
        self.links().last().cloned().expect("no connection yet")
    }

    /// Wait until `n` transports have connected.
    pub async fn wait_for_links(&self, n: usize) -> MockLink {
        wait_until(|| self.links().len() >= n).await;
        self.links()[n - 1].clone()
    }
}

/// Server side of one mock connection.
#[derive(Clone)]
pub struct MockLink {
    incoming: mpsc::UnboundedSender<Incoming>,
    outgoing: Arc<Mutex<Vec<ClientFrame>>>,
    disconnected: Arc<AtomicBool>,
}

impl MockLink {
    pub fn push(&self, frame: ServerFrame) {
        let _ = self.incoming.send(Incoming::Frame(frame));
    }

    pub fn push_malformed(&self, text: &str) {
        let _ = self.incoming.send(Incoming::Malformed(text.to_string()));
    }

    /// Close from the server side.
    pub fn close(&self) {
        let _ = self.incoming.send(Incoming::Close);
    }

    /// Break the connection with a receive error.
    pub fn fail(&self) {
        let _ = self.incoming.send(Incoming::Fail);
    }

    pub fn sent(&self) -> Vec<ClientFrame> {
        self.outgoing.lock().unwrap().clone()
    }

    /// Ids of `start` frames sent on this link.
    pub fn starts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|f| match f {
                ClientFrame::Start { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Ids of `stop` frames sent on this link.
    pub fn stops(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|f| match f {
                ClientFrame::Stop { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Whether the client disconnected this link.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

/// Transport handed out by [`MockGateway`].
pub struct MockTransport {
    gateway: Arc<GatewayState>,
    link: Option<(MockLink, mpsc::UnboundedReceiver<Incoming>)>,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

impl Transport for MockTransport {
    fn connect(&mut self, _url: &str) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            let gw = &self.gateway;
            gw.connect_attempts.fetch_add(1, Ordering::SeqCst);
            let refused_once = gw
                .refuse_next
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if refused_once || gw.refuse_all.load(Ordering::SeqCst) {
                return Err(TransportError::ConnectionFailed("mock refused".into()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            let link = MockLink {
                incoming: tx,
                outgoing: Arc::new(Mutex::new(Vec::new())),
                disconnected: Arc::new(AtomicBool::new(false)),
            };
            gw.links.lock().unwrap().push(link.clone());
            self.link = Some((link, rx));
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            if let Some((link, _)) = self.link.take() {
                link.disconnected.store(true, Ordering::SeqCst);
            }
            Ok(())
        })
    }

    fn send(&mut self, frame: ClientFrame) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            let (link, _) = self.link.as_ref().ok_or(TransportError::ConnectionClosed)?;
            let is_init = matches!(frame, ClientFrame::ConnectionInit { .. });
            link.outgoing.lock().unwrap().push(frame);
            if is_init && self.gateway.auto_ack.load(Ordering::SeqCst) {
                let window = *self.gateway.ack_window.lock().unwrap();
                link.push(ServerFrame::ack(window));
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<ServerFrame>>> {
        Box::pin(async move {
            let (_, rx) = self.link.as_mut().ok_or(TransportError::ConnectionClosed)?;
            match rx.recv().await {
                Some(Incoming::Frame(frame)) => Ok(Some(frame)),
                Some(Incoming::Malformed(text)) => Err(TransportError::SerializationError(text)),
                Some(Incoming::Fail) => Err(TransportError::ReceiveFailed("mock failure".into())),
                Some(Incoming::Close) | None => {
                    self.link = None;
                    Ok(None)
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.link.is_some()
    }
}

/// Poll `cond` until it holds, advancing (possibly paused) time in small steps.
pub async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..12_000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}
