//! Agent roster construction.
//!
//! Builds the [`AgentRegistry`] either from `[[agents]]` config entries
//! or, when none are configured, from the built-in driver-insurance
//! consultation roster: a router that triages, a sales consultant, a
//! product-knowledge expert, and a general support agent. Handoff
//! capabilities are generated from the roster's edges, so the registry
//! and the transfer graph can never drift apart.

use std::sync::Arc;

use baton_config::AppConfig;
use baton_core::{AgentDefinition, AgentRegistry, Capability, Error, Result};
use baton_tools::{
    HandoffCapability, InMemoryKnowledge, KnowledgeBackend, KnowledgeSearchCapability,
    MissingInfoCapability, ProfileUpdateCapability,
};

const ROUTER_INSTRUCTIONS: &str = "You are the first point of contact for a driver-insurance service. \
Greet the customer, work out what they need, and transfer them to the right specialist: \
sales for quotes, plan comparisons, and purchases; knowledge for questions about coverage, \
claims, and policy details; general for anything else. Record any customer facts you learn \
with update_profile before transferring. Do not answer product questions yourself.";

const SALES_INSTRUCTIONS: &str = "You are a driver-insurance sales consultant. Your goal is a \
recommendation the customer trusts. Record every fact the customer reveals with update_profile. \
Before recommending a plan, call missing_customer_info; if any critical field is missing, ask \
about it instead of guessing. Recommend minimal, standard, or premium based on the profile, and \
explain the reasoning in plain language. Transfer to knowledge for detailed policy questions you \
cannot answer, or to general if the customer changes topic.";

const KNOWLEDGE_INSTRUCTIONS: &str = "You are a driver-insurance product expert. Answer coverage, \
claims, and policy questions using knowledge_search; ground every answer in the retrieved \
snippets and say so when nothing relevant was found. Record customer facts that come up with \
update_profile. Transfer to sales when the customer wants a quote or is ready to buy, or to \
general for unrelated requests.";

const GENERAL_INSTRUCTIONS: &str = "You handle driver-insurance requests that fit no specialist: \
account questions, complaints, small talk, and anything off-topic. Be brief and helpful. If the \
conversation turns toward buying insurance, transfer to sales; for coverage or claims questions, \
transfer to knowledge.";

/// The built-in consultation roster. `model` applies to every agent.
pub fn default_roster(model: &str) -> AgentRegistry {
    let knowledge_backend: Arc<dyn KnowledgeBackend> = Arc::new(InMemoryKnowledge::seeded());
    let mut registry = AgentRegistry::new();

    registry.register(
        AgentDefinition::new("router", ROUTER_INSTRUCTIONS, model)
            .with_capability(Arc::new(ProfileUpdateCapability))
            .with_capability(handoff_to("sales"))
            .with_capability(handoff_to("knowledge"))
            .with_capability(handoff_to("general")),
    );

    registry.register(
        AgentDefinition::new("sales", SALES_INSTRUCTIONS, model)
            .with_capability(Arc::new(ProfileUpdateCapability))
            .with_capability(Arc::new(MissingInfoCapability))
            .with_capability(handoff_to("knowledge"))
            .with_capability(handoff_to("general")),
    );

    registry.register(
        AgentDefinition::new("knowledge", KNOWLEDGE_INSTRUCTIONS, model)
            .with_capability(Arc::new(ProfileUpdateCapability))
            .with_capability(Arc::new(KnowledgeSearchCapability::new(
                knowledge_backend.clone(),
            )))
            .with_capability(handoff_to("sales"))
            .with_capability(handoff_to("general")),
    );

    registry.register(
        AgentDefinition::new("general", GENERAL_INSTRUCTIONS, model)
            .with_capability(Arc::new(ProfileUpdateCapability))
            .with_capability(handoff_to("sales"))
            .with_capability(handoff_to("knowledge")),
    );

    registry
}

/// Build the registry from configuration, falling back to the built-in
/// roster when no `[[agents]]` entries exist.
pub fn roster_from_config(config: &AppConfig) -> Result<AgentRegistry> {
    if config.agents.is_empty() {
        return Ok(default_roster(&config.default_model));
    }

    let knowledge_backend: Arc<dyn KnowledgeBackend> = Arc::new(InMemoryKnowledge::seeded());
    let mut registry = AgentRegistry::new();

    for entry in &config.agents {
        let model = entry.model.as_deref().unwrap_or(&config.default_model);
        let mut agent = AgentDefinition::new(&entry.name, &entry.instructions, model);

        for capability_name in &entry.capabilities {
            agent = agent.with_capability(builtin_capability(
                capability_name,
                &knowledge_backend,
            )?);
        }
        for target in &entry.handoffs {
            agent = agent.with_capability(handoff_to(target));
        }

        registry.register(agent);
    }

    Ok(registry)
}

fn handoff_to(target: &str) -> Arc<dyn Capability> {
    Arc::new(HandoffCapability::to(
        target,
        format!("Transfer the conversation to the {target} agent."),
    ))
}

fn builtin_capability(
    name: &str,
    knowledge_backend: &Arc<dyn KnowledgeBackend>,
) -> Result<Arc<dyn Capability>> {
    match name {
        "update_profile" => Ok(Arc::new(ProfileUpdateCapability)),
        "missing_customer_info" => Ok(Arc::new(MissingInfoCapability)),
        "knowledge_search" => Ok(Arc::new(KnowledgeSearchCapability::new(
            knowledge_backend.clone(),
        ))),
        other => Err(Error::Config {
            message: format!("unknown built-in capability '{other}'"),
        }),
    }
}
