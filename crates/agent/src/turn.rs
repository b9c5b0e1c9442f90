//! Single-agent turn execution.
//!
//! One turn is the completion↔capability loop for whichever agent owns
//! the session: send instructions + history + descriptors, execute any
//! tool calls the model requested, feed the results back, repeat until
//! the model answers in text, a capability signals a handoff, or the
//! round ceiling is hit.
//!
//! Two invariants live here. Every tool call in a round gets its tool
//! message appended, even calls that failed or arrived after a handoff
//! signal, so the history never carries an unanswered call id. And the
//! system message is rebuilt from the agent's instructions and profile
//! on every request, never stored in the session, so a handed-off
//! session replays cleanly under the next agent's instructions.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use baton_core::{
    AgentDefinition, AgentHandle, CapabilityContext, CapabilityOutcome, CompletionRequest,
    CompletionService, DomainEvent, Error, EventBus, Message, ProviderError, Session,
};

/// Text returned when the model never stops calling capabilities.
const ROUND_CEILING_REPLY: &str =
    "I was unable to finish processing that request. Could you rephrase or simplify it?";

/// What a single agent turn produced.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The assistant text from the last round. Empty when the turn ended
    /// on a handoff the model sent without accompanying text.
    pub reply: String,

    /// Set when a capability signalled that control should pass on.
    pub pending_handoff: Option<AgentHandle>,

    /// Completion rounds consumed.
    pub rounds: u32,
}

/// Runs turns for any agent against one completion service.
pub struct TurnRunner {
    service: Arc<dyn CompletionService>,
    temperature: f32,
    max_tokens: Option<u32>,
    max_rounds: u32,
    request_timeout: Duration,
    event_bus: Arc<EventBus>,
}

impl TurnRunner {
    pub fn new(service: Arc<dyn CompletionService>, event_bus: Arc<EventBus>) -> Self {
        Self {
            service,
            temperature: 0.7,
            max_tokens: None,
            max_rounds: 8,
            request_timeout: Duration::from_secs(60),
            event_bus,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Ceiling on completion↔capability rounds per turn.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    /// Deadline for each individual completion request.
    pub fn with_request_timeout(mut self, deadline: Duration) -> Self {
        self.request_timeout = deadline;
        self
    }

    /// Instructions plus whatever the agent already knows about the
    /// customer. Built fresh per request.
    fn system_message(agent: &AgentDefinition, session: &Session) -> Message {
        let mut prompt = agent.instructions().to_string();
        if let Some(profile) = session.profile(agent.name())
            && !profile.is_empty()
        {
            prompt.push_str("\n\n## Known customer profile\n");
            prompt.push_str(&profile.summary());
            let missing = profile.missing_critical();
            if !missing.is_empty() {
                prompt.push_str("\n\nStill unknown (ask before recommending): ");
                prompt.push_str(&missing.join(", "));
            }
        }
        Message::system(prompt)
    }

    /// Run one turn for `agent` on `session`.
    ///
    /// The session history must already end with the message that
    /// triggered this turn. On `Err` the session is left as-is; rollback
    /// is the orchestrator's job.
    pub async fn run(
        &self,
        agent: &AgentDefinition,
        session: &mut Session,
    ) -> Result<TurnOutcome, Error> {
        let descriptors = agent.descriptors().to_vec();
        let mut rounds = 0;

        loop {
            if rounds >= self.max_rounds {
                warn!(
                    session_id = %session.id,
                    agent = agent.name(),
                    rounds,
                    "Round ceiling reached, forcing text reply"
                );
                session.push(Message::assistant(ROUND_CEILING_REPLY).from_agent(agent.name()));
                return Ok(TurnOutcome {
                    reply: ROUND_CEILING_REPLY.into(),
                    pending_handoff: None,
                    rounds,
                });
            }
            rounds += 1;

            let mut messages = Vec::with_capacity(session.messages.len() + 1);
            messages.push(Self::system_message(agent, session));
            messages.extend(session.messages.iter().cloned());

            let request = CompletionRequest {
                model: agent.model().to_string(),
                messages,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: descriptors.clone(),
            };

            debug!(
                session_id = %session.id,
                agent = agent.name(),
                round = rounds,
                "Requesting completion"
            );

            let response = match timeout(self.request_timeout, self.service.complete(request)).await
            {
                Ok(result) => result?,
                Err(_) => {
                    return Err(ProviderError::Timeout(format!(
                        "completion exceeded {}s deadline",
                        self.request_timeout.as_secs()
                    ))
                    .into());
                }
            };

            if let Some(usage) = &response.usage {
                self.event_bus.publish(DomainEvent::ReplyGenerated {
                    session_id: session.id.to_string(),
                    agent: agent.name().to_string(),
                    model: response.model.clone(),
                    tokens_used: usage.total_tokens,
                    timestamp: chrono::Utc::now(),
                });
            }

            if response.message.tool_calls.is_empty() {
                let reply = response.message.content.clone();
                session.push(response.message.from_agent(agent.name()));
                return Ok(TurnOutcome {
                    reply,
                    pending_handoff: None,
                    rounds,
                });
            }

            let tool_calls = response.message.tool_calls.clone();
            let round_text = response.message.content.clone();
            session.push(response.message.from_agent(agent.name()));

            // First handoff in the round wins; the rest still get their
            // acknowledgement messages so no call id dangles.
            let mut pending_handoff: Option<AgentHandle> = None;

            for call in &tool_calls {
                let started = std::time::Instant::now();
                let result = self.dispatch(agent, session, call).await;
                let duration_ms = started.elapsed().as_millis() as u64;

                let content = match result {
                    Ok(outcome) => {
                        self.event_bus.publish(DomainEvent::CapabilityInvoked {
                            agent: agent.name().to_string(),
                            capability: call.name.clone(),
                            success: true,
                            duration_ms,
                            timestamp: chrono::Utc::now(),
                        });
                        if let CapabilityOutcome::Handoff(handle) = &outcome
                            && pending_handoff.is_none()
                        {
                            pending_handoff = Some(handle.clone());
                        }
                        outcome.to_tool_content()
                    }
                    Err(e) => {
                        warn!(
                            capability = %call.name,
                            agent = agent.name(),
                            error = %e,
                            "Capability dispatch failed"
                        );
                        self.event_bus.publish(DomainEvent::CapabilityInvoked {
                            agent: agent.name().to_string(),
                            capability: call.name.clone(),
                            success: false,
                            duration_ms,
                            timestamp: chrono::Utc::now(),
                        });
                        format!("Error: {e}")
                    }
                };

                session.push(Message::tool_result(&call.id, content).from_agent(agent.name()));
            }

            if pending_handoff.is_some() {
                return Ok(TurnOutcome {
                    reply: round_text,
                    pending_handoff,
                    rounds,
                });
            }
        }
    }

    /// Resolve and invoke one capability call. Argument parse failures
    /// and unknown names surface as errors for the model, never as
    /// panics or aborted turns.
    async fn dispatch(
        &self,
        agent: &AgentDefinition,
        session: &mut Session,
        call: &baton_core::MessageToolCall,
    ) -> Result<CapabilityOutcome, baton_core::CapabilityError> {
        let capability = agent
            .capability(&call.name)
            .ok_or_else(|| baton_core::CapabilityError::Unknown(call.name.clone()))?
            .clone();

        let arguments: serde_json::Value = if call.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.arguments)
                .map_err(|e| baton_core::CapabilityError::ArgumentParse(e.to_string()))?
        };

        let mut cx = CapabilityContext {
            agent: agent.name(),
            profile: session.profile_mut(agent.name()),
        };
        capability.invoke(arguments, &mut cx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        HangingService, SequentialMockService, make_text_response, make_tool_call,
        make_tool_call_response,
    };
    use baton_core::Role;
    use baton_tools::{HandoffCapability, ProfileUpdateCapability};
    use std::sync::Arc;

    fn runner(service: SequentialMockService) -> TurnRunner {
        TurnRunner::new(Arc::new(service), Arc::new(EventBus::default()))
    }

    fn sales_agent() -> AgentDefinition {
        AgentDefinition::new("sales", "You sell driver insurance.", "mock-model")
            .with_capability(Arc::new(ProfileUpdateCapability))
            .with_capability(Arc::new(HandoffCapability::to(
                "general",
                "Transfer to general support",
            )))
    }

    #[tokio::test]
    async fn plain_text_reply_ends_the_turn() {
        let runner = runner(SequentialMockService::single_text("Happy to help."));
        let agent = sales_agent();
        let mut session = Session::new("sales");
        session.push(Message::user("Hi"));

        let outcome = runner.run(&agent, &mut session).await.unwrap();
        assert_eq!(outcome.reply, "Happy to help.");
        assert_eq!(outcome.rounds, 1);
        assert!(outcome.pending_handoff.is_none());
        // user + assistant; system messages are never stored.
        assert_eq!(session.messages.len(), 2);
        assert!(session.messages.iter().all(|m| m.role != Role::System));
    }

    #[tokio::test]
    async fn capability_round_feeds_results_back() {
        let runner = runner(SequentialMockService::new(vec![
            make_tool_call_response(
                vec![make_tool_call("update_profile", serde_json::json!({"age": 31}))],
                "",
            ),
            make_text_response("Noted, you're 31."),
        ]));
        let agent = sales_agent();
        let mut session = Session::new("sales");
        session.push(Message::user("I'm 31"));

        let outcome = runner.run(&agent, &mut session).await.unwrap();
        assert_eq!(outcome.reply, "Noted, you're 31.");
        assert_eq!(outcome.rounds, 2);
        assert_eq!(session.profile("sales").unwrap().age, Some(31));
        assert!(session.tool_messages_are_consistent());
    }

    #[tokio::test]
    async fn handoff_ends_turn_but_answers_every_call() {
        let runner = runner(SequentialMockService::new(vec![make_tool_call_response(
            vec![
                make_tool_call("transfer_to_general", serde_json::json!({})),
                make_tool_call("update_profile", serde_json::json!({"age": 44})),
            ],
            "",
        )]));
        let agent = sales_agent();
        let mut session = Session::new("sales");
        session.push(Message::user("Something else"));

        let outcome = runner.run(&agent, &mut session).await.unwrap();
        assert_eq!(
            outcome.pending_handoff.as_ref().map(|h| h.name()),
            Some("general")
        );
        // The call after the handoff still ran and still got answered.
        assert_eq!(session.profile("sales").unwrap().age, Some(44));
        assert!(session.tool_messages_are_consistent());
        let tool_messages = session
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .count();
        assert_eq!(tool_messages, 2);
    }

    #[tokio::test]
    async fn unknown_capability_becomes_tool_error_text() {
        let runner = runner(SequentialMockService::new(vec![
            make_tool_call_response(
                vec![make_tool_call("summon_dragon", serde_json::json!({}))],
                "",
            ),
            make_text_response("Sorry, I can't do that."),
        ]));
        let agent = sales_agent();
        let mut session = Session::new("sales");
        session.push(Message::user("Do magic"));

        let outcome = runner.run(&agent, &mut session).await.unwrap();
        assert_eq!(outcome.reply, "Sorry, I can't do that.");
        let tool_msg = session
            .messages
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(tool_msg.content.starts_with("Error:"));
        assert!(tool_msg.content.contains("summon_dragon"));
        assert!(session.tool_messages_are_consistent());
    }

    #[tokio::test]
    async fn malformed_arguments_become_tool_error_text() {
        let mut bad_call = make_tool_call("update_profile", serde_json::json!({}));
        bad_call.arguments = "{not json".into();
        let runner = runner(SequentialMockService::new(vec![
            make_tool_call_response(vec![bad_call], ""),
            make_text_response("Could you repeat that?"),
        ]));
        let agent = sales_agent();
        let mut session = Session::new("sales");
        session.push(Message::user("hm"));

        let outcome = runner.run(&agent, &mut session).await.unwrap();
        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.reply, "Could you repeat that?");
        assert!(session.tool_messages_are_consistent());
    }

    #[tokio::test]
    async fn round_ceiling_forces_text_reply() {
        let responses: Vec<_> = (0..3)
            .map(|_| {
                make_tool_call_response(
                    vec![make_tool_call("update_profile", serde_json::json!({"age": 31}))],
                    "",
                )
            })
            .collect();
        let runner = runner(SequentialMockService::new(responses)).with_max_rounds(3);
        let agent = sales_agent();
        let mut session = Session::new("sales");
        session.push(Message::user("loop"));

        let outcome = runner.run(&agent, &mut session).await.unwrap();
        assert_eq!(outcome.rounds, 3);
        assert_eq!(outcome.reply, ROUND_CEILING_REPLY);
        assert!(session.tool_messages_are_consistent());
    }

    #[tokio::test]
    async fn provider_failure_propagates_as_service_unavailable() {
        let runner = runner(SequentialMockService::failing(ProviderError::Network(
            "connection refused".into(),
        )));
        let agent = sales_agent();
        let mut session = Session::new("sales");
        session.push(Message::user("Hi"));

        let err = runner.run(&agent, &mut session).await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn request_deadline_aborts_the_round_cleanly() {
        let runner = TurnRunner::new(Arc::new(HangingService), Arc::new(EventBus::default()))
            .with_request_timeout(Duration::from_millis(50));
        let agent = sales_agent();
        let mut session = Session::new("sales");
        session.push(Message::user("Hi"));
        let before = session.messages.len();

        let err = runner.run(&agent, &mut session).await.unwrap_err();
        assert!(matches!(
            err,
            Error::ServiceUnavailable(ProviderError::Timeout(_))
        ));
        // The aborted round left nothing behind, dangling calls included.
        assert_eq!(session.messages.len(), before);
        assert!(session.tool_messages_are_consistent());
    }

    #[tokio::test]
    async fn system_message_carries_profile_summary() {
        let mut session = Session::new("sales");
        session
            .profile_mut("sales")
            .update(serde_json::json!({"age": 52}).as_object().unwrap());

        let agent = sales_agent();
        let system = TurnRunner::system_message(&agent, &session);
        assert!(system.content.contains("age: 52"));
        assert!(system.content.contains("driving_experience"));
    }
}
