//! Domain event system — decoupled observation of dialogue decisions.
//!
//! The dialogue manager publishes an event for every branch it takes.
//! Observers (CLI status lines, tests, metrics exporters) subscribe
//! without being wired into the manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// New context was fetched for a query
    ContextRetrieved {
        query_preview: String,
        context_chars: usize,
        timestamp: DateTime<Utc>,
    },

    /// A query was answered from existing context
    FollowUpAnswered {
        query_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// The classifier failed and the new-query default was used
    ClassificationFallback {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The completion service produced a response
    ResponseGenerated {
        exchanges: usize,
        response_chars: usize,
        timestamp: DateTime<Utc>,
    },

    /// An error ended a turn
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// First `max` characters of `text`, on a char boundary.
pub fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
