//! Session lifecycle and per-session serialization.
//!
//! One `tokio::sync::Mutex` per session: turns for the same session run
//! strictly in order while different sessions proceed in parallel. The
//! outer map lock is held only long enough to look up or insert the
//! session handle, never across a turn.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use baton_core::{DomainEvent, Error, EventBus, Message, Result, Session};

use crate::orchestrator::Orchestrator;

/// The user-facing result of one processed message.
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub reply: String,
    /// The agent that owns the session after this turn.
    pub agent: String,
}

/// Creates sessions on first use and serializes turns per session.
pub struct SessionManager {
    orchestrator: Orchestrator,
    entry_agent: String,
    event_bus: Arc<EventBus>,
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionManager {
    pub fn new(
        orchestrator: Orchestrator,
        entry_agent: impl Into<String>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            orchestrator,
            entry_agent: entry_agent.into(),
            event_bus,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn entry_agent(&self) -> &str {
        &self.entry_agent
    }

    /// The session handle for `id`, created on first use.
    async fn session_handle(&self, id: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(session_id = id, "Creating session");
                Arc::new(Mutex::new(Session::with_id(
                    baton_core::SessionId::from(id),
                    &self.entry_agent,
                )))
            })
            .clone()
    }

    /// The session handle for `id`, or `UnknownSession`.
    async fn existing_handle(&self, id: &str) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownSession(id.to_string()))
    }

    /// Process one user message in the named session.
    pub async fn process(&self, session_id: &str, text: &str) -> Result<TurnReply> {
        let handle = self.session_handle(session_id).await;
        let mut session = handle.lock().await;

        let reply = self.orchestrator.run_turn(&mut session, text).await?;
        Ok(TurnReply {
            reply,
            agent: session.active_agent.clone(),
        })
    }

    /// Wipe the named session back to the entry-point agent.
    pub async fn reset(&self, session_id: &str) -> Result<()> {
        let handle = self.existing_handle(session_id).await?;
        let mut session = handle.lock().await;
        session.reset(&self.entry_agent);
        info!(session_id, "Session reset");
        self.event_bus.publish(DomainEvent::SessionReset {
            session_id: session_id.to_string(),
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// The named session's message history.
    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        let handle = self.existing_handle(session_id).await?;
        let session = handle.lock().await;
        Ok(session.messages.clone())
    }

    /// A point-in-time copy of the named session.
    pub async fn snapshot(&self, session_id: &str) -> Result<Session> {
        let handle = self.existing_handle(session_id).await?;
        let session = handle.lock().await;
        Ok(session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster;
    use crate::test_helpers::SequentialMockService;
    use crate::turn::TurnRunner;
    use baton_core::AgentRegistry;

    fn manager(service: SequentialMockService) -> SessionManager {
        let bus = Arc::new(EventBus::default());
        let registry: Arc<AgentRegistry> = Arc::new(roster::default_roster("mock-model"));
        let runner = TurnRunner::new(Arc::new(service), bus.clone());
        let orchestrator = Orchestrator::new(registry, runner, bus.clone());
        SessionManager::new(orchestrator, "router", bus)
    }

    #[tokio::test]
    async fn first_message_creates_the_session() {
        let manager = manager(SequentialMockService::single_text("Hello there."));
        let reply = manager.process("s1", "hi").await.unwrap();
        assert_eq!(reply.reply, "Hello there.");
        assert_eq!(reply.agent, "router");

        let history = manager.history("s1").await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn unknown_session_errors_for_read_paths() {
        let manager = manager(SequentialMockService::single_text("unused"));
        assert!(matches!(
            manager.history("nope").await,
            Err(Error::UnknownSession(_))
        ));
        assert!(matches!(
            manager.reset("nope").await,
            Err(Error::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn reset_returns_session_to_entry_agent() {
        let manager = manager(SequentialMockService::single_text("Hi."));
        manager.process("s1", "hello").await.unwrap();

        manager.reset("s1").await.unwrap();
        let snapshot = manager.snapshot("s1").await.unwrap();
        assert_eq!(snapshot.active_agent, "router");
        assert!(snapshot.messages.is_empty());
        assert!(snapshot.profiles.is_empty());
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let manager = manager(SequentialMockService::new(vec![
            crate::test_helpers::make_text_response("one"),
            crate::test_helpers::make_text_response("two"),
        ]));
        manager.process("a", "first").await.unwrap();
        manager.process("b", "second").await.unwrap();

        assert_eq!(manager.history("a").await.unwrap().len(), 2);
        assert_eq!(manager.history("b").await.unwrap().len(), 2);
    }
}
