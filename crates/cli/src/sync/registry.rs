// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-topic subscription bookkeeping and event routing.
//!
//! Each topic has at most one entry. Entries own the caller's callback in a
//! delivery slot; delivery holds the slot lock for the duration of the
//! callback, so once `unregister` returns no further call can begin. The
//! slot lock is re-entrant, which lets a callback cancel its own
//! subscription. The entries lock and a slot lock are never held together.
//!
//! A release issued from inside a callback never blocks on another slot.
//! It marks the slot released instead, so a call already running on another
//! thread may still finish after the release returns.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use mm_core::protocol::DataPayload;
use mm_core::{EventPayload, Topic, TopicEvent};
use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::connection::FrameSink;
use super::controller::Control;

/// Caller-supplied event callback.
pub type Callback = Arc<dyn Fn(&TopicEvent) + Send + Sync>;

type Slot = Arc<DeliverySlot>;

struct DeliverySlot {
    callback: ReentrantMutex<RefCell<Option<Callback>>>,
    released: AtomicBool,
}

impl DeliverySlot {
    fn new(callback: Callback) -> Slot {
        Arc::new(DeliverySlot {
            callback: ReentrantMutex::new(RefCell::new(Some(callback))),
            released: AtomicBool::new(false),
        })
    }
}

thread_local! {
    /// Callbacks currently running on this thread.
    static DELIVERING: Cell<u32> = const { Cell::new(0) };
}

struct DeliveryScope;

impl DeliveryScope {
    fn enter() -> Self {
        DELIVERING.with(|d| d.set(d.get() + 1));
        DeliveryScope
    }

    fn active() -> bool {
        DELIVERING.with(|d| d.get() > 0)
    }
}

impl Drop for DeliveryScope {
    fn drop(&mut self) {
        DELIVERING.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Identity of one subscription, distinct across re-subscriptions of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Lifecycle of a topic's live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// First connection attempt in progress.
    Connecting,
    /// Topic started on an open connection.
    Open,
    /// Waiting out a backoff delay or retrying.
    Reconnecting,
    /// Reconnection exhausted; served by the fallback poller.
    Failed,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionState::Connecting => "connecting",
            SubscriptionState::Open => "open",
            SubscriptionState::Reconnecting => "reconnecting",
            SubscriptionState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub topic: Topic,
    pub token: SubscriptionToken,
    pub state: SubscriptionState,
    pub attempt_count: u32,
    pub connection_id: Option<u64>,
}

/// Result of [`Registry::register`].
pub enum Registration {
    /// The topic already had an entry; nothing was created.
    Existing(SubscriptionToken),
    /// A new entry; the caller must drive it with a controller.
    New {
        token: SubscriptionToken,
        control: mpsc::UnboundedReceiver<Control>,
        cancel: CancellationToken,
    },
}

struct Entry {
    token: SubscriptionToken,
    slot: Slot,
    state: SubscriptionState,
    attempt_count: u32,
    connection_id: Option<u64>,
    control: mpsc::UnboundedSender<Control>,
    cancel: CancellationToken,
}

/// Registry of active subscriptions, keyed by topic.
#[derive(Default)]
pub struct Registry {
    entries: Mutex<HashMap<Topic, Entry>>,
    next_token: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `topic`, or return the existing entry's token.
    ///
    /// A repeated registration keeps the original callback.
    pub fn register(&self, topic: &Topic, callback: Callback) -> Registration {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(topic) {
            debug!(topic = %topic, "topic already subscribed");
            return Registration::Existing(entry.token);
        }

        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed) + 1);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        entries.insert(
            topic.clone(),
            Entry {
                token,
                slot: DeliverySlot::new(callback),
                state: SubscriptionState::Connecting,
                attempt_count: 0,
                connection_id: None,
                control: control_tx,
                cancel: cancel.clone(),
            },
        );

        Registration::New {
            token,
            control: control_rx,
            cancel,
        }
    }

    /// Deliver `event` to its topic's callback. Returns whether it was delivered.
    pub fn route(&self, event: &TopicEvent) -> bool {
        let slot = {
            let entries = self.entries.lock();
            entries.get(&event.topic).map(|e| Arc::clone(&e.slot))
        };
        match slot {
            Some(slot) => deliver(&slot, event),
            None => {
                debug!(topic = %event.topic, "no subscriber for event");
                false
            }
        }
    }

    /// Remove `topic`'s entry. Idempotent; returns whether an entry existed.
    pub fn unregister(&self, topic: &Topic) -> bool {
        let entry = self.entries.lock().remove(topic);
        match entry {
            Some(entry) => {
                release(entry);
                true
            }
            None => false,
        }
    }

    /// Remove `topic`'s entry only if it still belongs to `token`.
    pub fn unregister_token(&self, topic: &Topic, token: SubscriptionToken) -> bool {
        let entry = {
            let mut entries = self.entries.lock();
            match entries.get(topic) {
                Some(entry) if entry.token == token => entries.remove(topic),
                _ => None,
            }
        };
        match entry {
            Some(entry) => {
                release(entry);
                true
            }
            None => false,
        }
    }

    /// Remove every entry. Returns how many were removed.
    pub fn unregister_all(&self) -> usize {
        let drained: Vec<Entry> = self.entries.lock().drain().map(|(_, e)| e).collect();
        let count = drained.len();
        for entry in drained {
            release(entry);
        }
        count
    }

    /// Record a controller's progress. Ignored when `token` is stale.
    pub fn set_state(
        &self,
        topic: &Topic,
        token: SubscriptionToken,
        state: SubscriptionState,
        attempt_count: u32,
    ) {
        self.update(topic, token, |entry| {
            entry.state = state;
            entry.attempt_count = attempt_count;
        });
    }

    pub fn set_connection(&self, topic: &Topic, token: SubscriptionToken, connection_id: Option<u64>) {
        self.update(topic, token, |entry| entry.connection_id = connection_id);
    }

    /// Send a control message to `topic`'s controller.
    pub fn signal(&self, topic: &Topic, control: Control) -> bool {
        let entries = self.entries.lock();
        entries
            .get(topic)
            .is_some_and(|e| e.control.send(control).is_ok())
    }

    /// Send a control message to every controller. Returns how many received it.
    pub fn signal_all(&self, control: impl Fn() -> Control) -> usize {
        let entries = self.entries.lock();
        entries
            .values()
            .filter(|e| e.control.send(control()).is_ok())
            .count()
    }

    pub fn state(&self, topic: &Topic) -> Option<SubscriptionState> {
        self.entries.lock().get(topic).map(|e| e.state)
    }

    pub fn token(&self, topic: &Topic) -> Option<SubscriptionToken> {
        self.entries.lock().get(topic).map(|e| e.token)
    }

    pub fn is_active(&self, topic: &Topic, token: SubscriptionToken) -> bool {
        self.entries
            .lock()
            .get(topic)
            .is_some_and(|e| e.token == token)
    }

    /// All entries, ordered by topic.
    pub fn snapshot(&self) -> Vec<SubscriptionInfo> {
        let mut infos: Vec<SubscriptionInfo> = self
            .entries
            .lock()
            .iter()
            .map(|(topic, e)| SubscriptionInfo {
                topic: topic.clone(),
                token: e.token,
                state: e.state,
                attempt_count: e.attempt_count,
                connection_id: e.connection_id,
            })
            .collect();
        infos.sort_by(|a, b| a.topic.cmp(&b.topic));
        infos
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn update(&self, topic: &Topic, token: SubscriptionToken, f: impl FnOnce(&mut Entry)) {
        if let Some(entry) = self.entries.lock().get_mut(topic) {
            if entry.token == token {
                f(entry);
            }
        }
    }
}

/// Clear the slot, then stop the controller.
fn release(entry: Entry) {
    entry.slot.released.store(true, Ordering::Release);
    if DeliveryScope::active() {
        // Inside a callback: waiting on another slot could deadlock.
        if let Some(guard) = entry.slot.callback.try_lock() {
            guard.borrow_mut().take();
        }
    } else {
        let guard = entry.slot.callback.lock();
        guard.borrow_mut().take();
    }
    entry.cancel.cancel();
}

fn deliver(slot: &DeliverySlot, event: &TopicEvent) -> bool {
    let guard = slot.callback.lock();
    if slot.released.load(Ordering::Acquire) {
        return false;
    }
    // Clone out so the RefCell is free if the callback cancels itself.
    let callback = guard.borrow().clone();
    let Some(callback) = callback else {
        return false;
    };
    let _scope = DeliveryScope::enter();
    if std::panic::catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
        warn!(event = "error", topic = %event.topic, "subscription callback panicked");
    }
    true
}

impl FrameSink for Registry {
    fn on_data(&self, connection_id: u64, topic_id: &str, payload: DataPayload) {
        let topic: Topic = match topic_id.parse() {
            Ok(topic) => topic,
            Err(e) => {
                warn!(event = "error", topic = topic_id, reason = %e, "dropping data frame");
                return;
            }
        };
        if !payload.errors.is_empty() {
            warn!(
                event = "error",
                topic = %topic,
                errors = ?payload.errors,
                "gateway reported subscription errors"
            );
        }
        match EventPayload::decode(topic.kind, &payload.data) {
            Ok(decoded) => {
                debug!(event = "message", topic = %topic, connection = connection_id, "data frame");
                self.route(&TopicEvent::live(topic, decoded));
            }
            Err(e) => {
                warn!(event = "error", topic = %topic, reason = %e, "dropping malformed data frame");
            }
        }
    }

    fn on_topic_closed(&self, connection_id: u64, topic_id: &str, reason: String) {
        match topic_id.parse::<Topic>() {
            Ok(topic) => {
                self.signal(
                    &topic,
                    Control::TopicLost {
                        connection_id,
                        reason,
                    },
                );
            }
            Err(e) => {
                warn!(event = "error", topic = topic_id, reason = %e, "topic closed for unknown id");
            }
        }
    }
}

/// Caller's handle to one subscription.
///
/// Handles are cheap to clone; all clones refer to the same subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    topic: Topic,
    token: SubscriptionToken,
    registry: Weak<Registry>,
}

impl SubscriptionHandle {
    pub(crate) fn new(topic: Topic, token: SubscriptionToken, registry: &Arc<Registry>) -> Self {
        SubscriptionHandle {
            topic,
            token,
            registry: Arc::downgrade(registry),
        }
    }

    /// Stop delivery and release the topic. Idempotent.
    ///
    /// No callback invocation starts after this returns. Called from inside
    /// another topic's callback it does not wait for a call already running
    /// on another thread.
    pub fn cancel(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister_token(&self.topic, self.token);
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn token(&self) -> SubscriptionToken {
        self.token
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|r| r.is_active(&self.topic, self.token))
    }
}

impl PartialEq for SubscriptionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.topic == other.topic && self.token == other.token
    }
}

impl Eq for SubscriptionHandle {}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
