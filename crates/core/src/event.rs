//! Domain event system — decoupled observation of the runtime.
//!
//! Events are published when something interesting happens (a reply, a
//! capability invocation, a handoff). Consumers subscribe without
//! coupling to the loop or orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// An agent produced a user-facing reply
    ReplyGenerated {
        session_id: String,
        agent: String,
        model: String,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    /// A capability was invoked
    CapabilityInvoked {
        agent: String,
        capability: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Control of a session passed between agents
    HandoffOccurred {
        session_id: String,
        from: String,
        to: String,
        timestamp: DateTime<Utc>,
    },

    /// A session was reset to the entry-point agent
    SessionReset {
        session_id: String,
        timestamp: DateTime<Utc>,
    },

    /// An error occurred
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handoff_event_reaches_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::HandoffOccurred {
            session_id: "s1".into(),
            from: "router".into(),
            to: "sales".into(),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::HandoffOccurred { from, to, .. } => {
                assert_eq!(from, "router");
                assert_eq!(to, "sales");
            }
            _ => panic!("expected HandoffOccurred"),
        }
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::SessionReset {
            session_id: "s1".into(),
            timestamp: Utc::now(),
        });
    }
}
