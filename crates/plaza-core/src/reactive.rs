//! Change notification
//!
//! Stores own their state and announce every accepted mutation on an
//! [`EventBus`]. Subscribers receive the event and re-read a snapshot from
//! the store; events are not a replication log.

use tokio::sync::broadcast;

/// Capacity of each subscriber's queue before it starts lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Receiving end handed to subscribers.
pub type EventStream<E> = broadcast::Receiver<E>;

/// Broadcast bus for store change events.
#[derive(Debug, Clone)]
pub struct EventBus<E: Clone> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    /// Create a bus with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a bus whose subscribers buffer at most `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> EventStream<E> {
        self.sender.subscribe()
    }

    /// Emit an event. Having no subscribers is not an error.
    pub fn emit(&self, event: E) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
