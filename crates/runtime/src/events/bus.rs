//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{HandleEvent, ReadModelEvent, TxEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Mint/withdraw attempt transitions and progress
    Transaction,
    /// Snapshot refreshes and per-field read failures
    ReadModel,
    /// Contract handle status
    Handle,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Transaction(TxEvent),
    ReadModel(ReadModelEvent),
    Handle(HandleEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Transaction(_) => Topic::Transaction,
            Event::ReadModel(_) => Topic::ReadModel,
            Event::Handle(_) => Topic::Handle,
        }
    }
}

/// Topic-based event bus
///
/// Consumers subscribe to the topics they care about. Publishing is
/// best-effort: a topic nobody listens to simply drops the event.
#[derive(Clone)]
pub struct EventBus {
    transaction: broadcast::Sender<Event>,
    read_model: broadcast::Sender<Event>,
    handle: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            transaction: broadcast::channel(capacity).0,
            read_model: broadcast::channel(capacity).0,
            handle: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Transaction => &self.transaction,
            Topic::ReadModel => &self.read_model,
            Topic::Handle => &self.handle,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> Vec<(Topic, broadcast::Receiver<Event>)> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
