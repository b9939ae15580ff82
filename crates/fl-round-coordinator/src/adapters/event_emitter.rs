//! Event emitter adapters.
//!
//! `BroadcastEventEmitter` fans committed events out to any number of
//! subscribers over a `tokio::sync::broadcast` channel. Slow subscribers
//! lag and lose events; the contract owes no delivery guarantee.

use crate::events::ContractEvent;
use crate::ports::EventEmitter;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default broadcast channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Broadcast-channel event emitter.
pub struct BroadcastEventEmitter {
    sender: broadcast::Sender<ContractEvent>,
    events_emitted: AtomicU64,
}

impl BroadcastEventEmitter {
    /// Create an emitter with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create an emitter with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            events_emitted: AtomicU64::new(0),
        }
    }

    /// Subscribe to events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ContractEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total events emitted, delivered or not.
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }
}

impl Default for BroadcastEventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventEmitter for BroadcastEventEmitter {
    fn emit(&self, name: &str, payload: &[u8]) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(ContractEvent::new(name, payload.to_vec())) {
            Ok(receivers) => debug!(event = name, receivers, "Event emitted"),
            Err(_) => warn!(event = name, "Event dropped (no subscribers)"),
        }
    }
}

/// Emitter that keeps every event in memory, in emission order.
#[derive(Default)]
pub struct RecordingEventEmitter {
    events: RwLock<Vec<ContractEvent>>,
}

impl RecordingEventEmitter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events.
    pub fn events(&self) -> Vec<ContractEvent> {
        self.events.read().clone()
    }

    /// Recorded events with the given name.
    pub fn named(&self, name: &str) -> Vec<ContractEvent> {
        self.events
            .read()
            .iter()
            .filter(|event| event.name == name)
            .cloned()
            .collect()
    }

    /// Number of recorded events with the given name.
    pub fn count(&self, name: &str) -> usize {
        self.events
            .read()
            .iter()
            .filter(|event| event.name == name)
            .count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl EventEmitter for RecordingEventEmitter {
    fn emit(&self, name: &str, payload: &[u8]) {
        self.events
            .write()
            .push(ContractEvent::new(name, payload.to_vec()));
    }
}
