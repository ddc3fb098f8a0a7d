//! Domain events: the write side of a turn, as seen by the host.
//!
//! A turn never mutates host UI state directly. Instead it publishes events
//! (a message was appended, tokens were used, a tool ran) that the host can
//! subscribe to and render however it likes.

use crate::message::Speaker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A record was appended to the host message log
    MessageAppended {
        speaker: Speaker,
        content_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// A model response reported token usage
    UsageRecorded {
        model: String,
        prompt_tokens: u32,
        completion_tokens: u32,
        total_tokens: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A turn finished with an answer
    TurnCompleted {
        iterations: u32,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A turn ended with a fatal error
    TurnFailed {
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

/// Shorten content for event payloads and log lines.
pub fn preview(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let cut: String = content.chars().take(max_chars).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ToolExecuted {
            tool_name: "calculator".into(),
            success: true,
            duration_ms: 3,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ToolExecuted {
                tool_name, success, ..
            } => {
                assert_eq!(tool_name, "calculator");
                assert!(success);
            }
            _ => panic!("Expected ToolExecuted event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::TurnFailed {
            error_message: "no subscribers".into(),
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("héllo wörld", 5), "héllo…");
    }
}
