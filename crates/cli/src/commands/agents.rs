//! `baton agents` — print the configured roster.
//!
//! Works without an API key: only the roster is built, never the
//! completion service.

use anyhow::Context;
use baton_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    let registry = baton_agent::roster_from_config(&config)?;

    let names: Vec<String> = registry.names().iter().map(|s| s.to_string()).collect();
    for name in names {
        let Some(agent) = registry.get(&name) else {
            continue;
        };
        let marker = if name == config.entry_agent { " (entry)" } else { "" };
        println!("{}{} [model: {}]", name, marker, agent.model());
        for capability in agent.capability_names() {
            println!("    {capability}");
        }
    }
    Ok(())
}
