//! The Baton conversation runtime.
//!
//! A user message flows through three layers:
//!
//! 1. **[`SessionManager`]** finds or creates the session and takes its
//!    lock, so turns in one session never interleave.
//! 2. **[`Orchestrator`]** runs turns until no handoff is pending,
//!    transferring the customer profile and containing cycles along the
//!    way. It is also the rollback boundary: a completion-service
//!    failure leaves the session untouched.
//! 3. **[`TurnRunner`]** drives the completion↔capability loop for one
//!    agent until the model answers in text, signals a handoff, or hits
//!    the round ceiling.

pub mod orchestrator;
pub mod roster;
pub mod sessions;
pub mod test_helpers;
pub mod turn;

pub use orchestrator::Orchestrator;
pub use roster::{default_roster, roster_from_config};
pub use sessions::{SessionManager, TurnReply};
pub use turn::{TurnOutcome, TurnRunner};

use std::sync::Arc;
use std::time::Duration;

use baton_config::AppConfig;
use baton_core::{CompletionService, EventBus, Result};

/// Wire a [`SessionManager`] from configuration and a completion
/// service: roster, runner knobs, orchestrator, entry agent.
pub fn session_manager_from_config(
    config: &AppConfig,
    service: Arc<dyn CompletionService>,
    event_bus: Arc<EventBus>,
) -> Result<SessionManager> {
    let registry = Arc::new(roster::roster_from_config(config)?);
    if registry.get(&config.entry_agent).is_none() {
        return Err(baton_core::Error::UnknownAgent(config.entry_agent.clone()));
    }

    let runner = TurnRunner::new(service, event_bus.clone())
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_max_rounds(config.max_rounds)
        .with_request_timeout(Duration::from_secs(config.request_timeout_secs));

    let orchestrator = Orchestrator::new(registry, runner, event_bus.clone());
    Ok(SessionManager::new(
        orchestrator,
        &config.entry_agent,
        event_bus,
    ))
}
