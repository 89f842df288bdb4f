//! Broadcast bus for sequence events.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

use crate::types::{Event, EventEnvelope};

/// A sequence emits `2 * stages + 2` events at most; this leaves room for
/// several concurrent sequences before slow subscribers start lagging.
const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of sequence events to any number of subscribers.
///
/// Every published event is stamped with the next number of one counter shared
/// by all clones, and envelopes reach subscribers in that order even when
/// several runs publish at once.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    next_sequence: Arc<Mutex<u64>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            next_sequence: Arc::new(Mutex::new(0)),
        }
    }

    /// Stamp `event` and send it, returning the envelope that went out.
    ///
    /// With no subscribers the envelope is dropped but its number is still used.
    pub fn publish(&self, event: Event) -> EventEnvelope {
        // held across the send so stamp order and delivery order agree
        let mut next = self
            .next_sequence
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let envelope = EventEnvelope::new(*next, event);
        *next += 1;
        let _ = self.sender.send(envelope.clone());
        envelope
    }

    /// Only events published after this call are delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Number of events published so far, which is also the next sequence number.
    pub fn published(&self) -> u64 {
        *self
            .next_sequence
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("published", &self.published())
            .finish()
    }
}
