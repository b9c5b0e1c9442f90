pub mod agents;
pub mod chat;
pub mod gateway;

use std::sync::Arc;

use anyhow::Context;
use baton_agent::SessionManager;
use baton_config::AppConfig;
use baton_core::EventBus;

/// Load + validate config and wire the runtime. Shared by every
/// command that talks to the completion service.
pub fn build_runtime() -> anyhow::Result<(AppConfig, Arc<SessionManager>)> {
    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let service = baton_providers::from_config(&config).context(
        "no completion service available — set api_key in ~/.baton/config.toml or export BATON_API_KEY",
    )?;
    let event_bus = Arc::new(EventBus::default());
    let manager = baton_agent::session_manager_from_config(&config, service, event_bus)
        .context("failed to build agent roster")?;

    Ok((config, Arc::new(manager)))
}
