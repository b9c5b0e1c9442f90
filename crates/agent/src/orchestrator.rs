//! Handoff orchestration across the agent roster.
//!
//! The orchestrator owns everything a single turn cannot see: which
//! agent runs next, what the customer profile transfer looks like, and
//! what happens when things go wrong. A user message triggers a turn on
//! the active agent; if that turn ends in a handoff, the profile is
//! copied to the target, ownership flips, and the target immediately
//! runs a follow-up turn so the caller hears from the agent that will
//! actually help them.
//!
//! Failure handling is asymmetric on purpose. A completion-service
//! failure rolls the whole turn back (history, active agent, and
//! profiles) so a retry sees exactly the pre-turn state; it is the only
//! error the caller observes. A handoff cycle is contained instead:
//! control stays where it was, the cycle is logged and published, and
//! the conversation carries on.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use baton_core::{AgentRegistry, DomainEvent, Error, EventBus, Message, Result, Session};

use crate::turn::TurnRunner;

/// Reply used when a contained cycle left no assistant text behind.
const CYCLE_FALLBACK_REPLY: &str = "I'm still here. How else can I help you?";

pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    runner: TurnRunner,
    event_bus: Arc<EventBus>,
}

impl Orchestrator {
    pub fn new(registry: Arc<AgentRegistry>, runner: TurnRunner, event_bus: Arc<EventBus>) -> Self {
        Self {
            registry,
            runner,
            event_bus,
        }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Process one user message and return the user-facing reply.
    ///
    /// On `Err(ServiceUnavailable)` the session is exactly as it was
    /// before the call; every other failure inside the turn is absorbed
    /// into the conversation itself.
    pub async fn run_turn(&self, session: &mut Session, user_text: &str) -> Result<String> {
        let prior_len = session.messages.len();
        let prior_agent = session.active_agent.clone();
        let prior_profiles = session.profiles.clone();

        session.push(Message::user(user_text));

        match self.drive(session).await {
            Ok(reply) => {
                debug_assert!(session.tool_messages_are_consistent());
                Ok(reply)
            }
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Turn failed, rolling back");
                self.event_bus.publish(DomainEvent::ErrorOccurred {
                    context: format!("turn for session {}", session.id),
                    error_message: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                session.messages.truncate(prior_len);
                session.active_agent = prior_agent;
                session.profiles = prior_profiles;
                Err(e)
            }
        }
    }

    /// Run turns until one ends without a handoff or a cycle is
    /// contained.
    async fn drive(&self, session: &mut Session) -> Result<String> {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(session.active_agent.clone());

        loop {
            let agent = self
                .registry
                .get(&session.active_agent)
                .ok_or_else(|| Error::UnknownAgent(session.active_agent.clone()))?;

            let outcome = self.runner.run(agent.as_ref(), session).await?;

            let Some(target) = outcome.pending_handoff else {
                return Ok(outcome.reply);
            };

            let Some(target_agent) = self.registry.resolve(&target) else {
                // A capability pointed at an agent that is not in the
                // roster. Contained like a cycle: control stays put.
                warn!(
                    session_id = %session.id,
                    target = %target,
                    "Handoff target not registered, keeping current agent"
                );
                self.event_bus.publish(DomainEvent::ErrorOccurred {
                    context: format!("handoff in session {}", session.id),
                    error_message: Error::UnknownAgent(target.name().to_string()).to_string(),
                    timestamp: chrono::Utc::now(),
                });
                return Ok(self.record_contained_reply(session, outcome.reply));
            };

            if !visited.insert(target.name().to_string()) {
                let err = Error::HandoffCycle {
                    agent: session.active_agent.clone(),
                };
                warn!(
                    session_id = %session.id,
                    target = %target,
                    "Handoff cycle contained, keeping current agent"
                );
                self.event_bus.publish(DomainEvent::ErrorOccurred {
                    context: format!("handoff in session {}", session.id),
                    error_message: err.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                return Ok(self.record_contained_reply(session, outcome.reply));
            }

            // Transfer what the handing-off agent learned. The merge is
            // lenient field-by-field, so a divergent copy never blocks
            // the handoff.
            let source_profile = session.profile(&session.active_agent).cloned();
            if let Some(source) = source_profile {
                let applied = session.profile_mut(target_agent.name()).merge_from(&source);
                if !applied.is_empty() {
                    info!(
                        session_id = %session.id,
                        to = target_agent.name(),
                        fields = applied.len(),
                        "Profile transferred on handoff"
                    );
                }
            }

            info!(
                session_id = %session.id,
                from = %session.active_agent,
                to = target_agent.name(),
                "Handoff"
            );
            self.event_bus.publish(DomainEvent::HandoffOccurred {
                session_id: session.id.to_string(),
                from: session.active_agent.clone(),
                to: target_agent.name().to_string(),
                timestamp: chrono::Utc::now(),
            });
            session.active_agent = target_agent.name().to_string();
            // Follow-up turn: the new owner speaks next.
        }
    }

    /// Record the reply a contained handoff produced. The turn ended on
    /// tool calls, so the history holds no final assistant text yet;
    /// append it so the next turn's model sees what the user was told.
    fn record_contained_reply(&self, session: &mut Session, reply: String) -> String {
        let reply = non_empty_reply(reply);
        let agent = session.active_agent.clone();
        session.push(Message::assistant(&reply).from_agent(agent));
        reply
    }
}

fn non_empty_reply(reply: String) -> String {
    if reply.trim().is_empty() {
        CYCLE_FALLBACK_REPLY.into()
    } else {
        reply
    }
}
