//! Inbound event subscriptions.
//!
//! Each `subscribe` call registers one listener on every physical channel of
//! an event kind. Log and refresh-state events have a legacy alias channel, so
//! a listener runs once per physical delivery; events arriving on both names
//! are delivered twice.

use std::{
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
};

use shared::protocol::{BridgeEvent, EventKind};
use tracing::{debug, warn};

type Listener = Arc<dyn Fn(&BridgeEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
struct HubState {
    next_id: u64,
    channels: HashMap<&'static str, Vec<Registered>>,
}

struct Registered {
    id: u64,
    listener: Listener,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Clone, Default)]
pub struct EventHub {
    inner: Arc<Mutex<HubState>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&BridgeEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let mut state = lock(&self.inner);
        state.next_id += 1;
        let id = state.next_id;
        for channel in kind.channels() {
            state.channels.entry(*channel).or_default().push(Registered {
                id,
                listener: Arc::clone(&listener),
            });
        }
        debug!(?kind, id, "registered bridge event listener");

        Subscription {
            id,
            kind,
            hub: Arc::downgrade(&self.inner),
            active: AtomicBool::new(true),
        }
    }

    /// Delivers `event` to every listener registered on `channel`. Listener
    /// failures are logged and counted; they never stop delivery.
    pub fn emit(&self, channel: &str, event: &BridgeEvent) -> DeliveryReport {
        if EventKind::from_channel(channel) != Some(event.kind()) {
            warn!(
                channel,
                kind = ?event.kind(),
                "dropping event published on a channel of another kind"
            );
            return DeliveryReport::default();
        }

        // Snapshot under the lock so listeners may (un)subscribe while running.
        let listeners: Vec<(u64, Listener)> = lock(&self.inner)
            .channels
            .get(channel)
            .map(|registered| {
                registered
                    .iter()
                    .map(|entry| (entry.id, Arc::clone(&entry.listener)))
                    .collect()
            })
            .unwrap_or_default();

        let mut report = DeliveryReport::default();
        for (id, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    warn!(channel, listener = id, "bridge event listener failed: {err:#}");
                }
                Err(panic) => {
                    report.failed += 1;
                    warn!(
                        channel,
                        listener = id,
                        "bridge event listener panicked: {}",
                        panic_message(panic.as_ref())
                    );
                }
            }
        }
        report
    }

    /// Emits on the primary channel of the event's kind.
    pub fn publish(&self, event: &BridgeEvent) -> DeliveryReport {
        self.emit(event.kind().primary_channel(), event)
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        lock(&self.inner)
            .channels
            .get(channel)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// Handle returned by [`EventHub::subscribe`]. Dropping it keeps the listener
/// registered; call [`Subscription::unsubscribe`] to detach.
pub struct Subscription {
    id: u64,
    kind: EventKind,
    hub: Weak<Mutex<HubState>>,
    active: AtomicBool,
}

impl Subscription {
    /// Detaches the listener from all of its channels. Returns `false` when it
    /// was already detached or the hub is gone.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            return false;
        }
        let Some(hub) = self.hub.upgrade() else {
            return false;
        };

        let mut state = lock(&hub);
        for channel in self.kind.channels() {
            if let Some(registered) = state.channels.get_mut(channel) {
                registered.retain(|entry| entry.id != self.id);
            }
        }
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

fn lock(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "tests/events_tests.rs"]
mod tests;
