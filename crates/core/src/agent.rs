//! Agent definitions, handles, and the startup registry.
//!
//! An [`AgentDefinition`] is immutable after construction: a name, an
//! instruction preamble, a model id, and a capability set with unique
//! names. Handoff targets are referenced through opaque
//! [`AgentHandle`]s and resolved against the [`AgentRegistry`], which is
//! built once at startup — agents never construct each other ad hoc.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::capability::{Capability, descriptor_for};
use crate::completion::ToolDescriptor;

/// An opaque reference to a registered agent.
///
/// Capabilities return this to signal a handoff; only the orchestrator
/// resolves it to an actual definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentHandle(String);

impl AgentHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A specialist agent: instructions, model, capabilities.
pub struct AgentDefinition {
    name: String,
    instructions: String,
    model: String,
    // BTreeMap keeps descriptor order stable across runs.
    capabilities: BTreeMap<String, Arc<dyn Capability>>,
    descriptors: OnceLock<Vec<ToolDescriptor>>,
}

impl AgentDefinition {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            capabilities: BTreeMap::new(),
            descriptors: OnceLock::new(),
        }
    }

    /// Add a capability. Names are unique within an agent's set; a
    /// duplicate replaces the earlier registration.
    pub fn with_capability(mut self, capability: Arc<dyn Capability>) -> Self {
        self.capabilities
            .insert(capability.name().to_string(), capability);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn handle(&self) -> AgentHandle {
        AgentHandle::new(&self.name)
    }

    /// Look up a capability by name.
    pub fn capability(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.capabilities.get(name)
    }

    pub fn capability_names(&self) -> Vec<&str> {
        self.capabilities.keys().map(|s| s.as_str()).collect()
    }

    /// Descriptors for the whole capability set, built once per agent
    /// instance and cached — descriptor building is pure, so the cache
    /// can never go stale.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        self.descriptors.get_or_init(|| {
            self.capabilities
                .values()
                .map(|c| descriptor_for(c.as_ref()))
                .collect()
        })
    }
}

impl std::fmt::Debug for AgentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDefinition")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("capabilities", &self.capability_names())
            .finish()
    }
}

/// The registry of all agents in the system, resolved once at startup.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<AgentDefinition>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Replaces any existing agent with the same name.
    pub fn register(&mut self, agent: AgentDefinition) {
        self.agents.insert(agent.name().to_string(), Arc::new(agent));
    }

    /// Get an agent by name.
    pub fn get(&self, name: &str) -> Option<Arc<AgentDefinition>> {
        self.agents.get(name).cloned()
    }

    /// Resolve a handoff handle.
    pub fn resolve(&self, handle: &AgentHandle) -> Option<Arc<AgentDefinition>> {
        self.get(handle.name())
    }

    /// List all registered agent names.
    pub fn names(&self) -> Vec<&str> {
        self.agents.keys().map(|s| s.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityContext, CapabilityOutcome, ParameterSpec};
    use crate::error::CapabilityError;
    use async_trait::async_trait;

    struct NamedCapability(&'static str);

    #[async_trait]
    impl Capability for NamedCapability {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "test capability"
        }
        fn parameters(&self) -> Vec<ParameterSpec> {
            vec![]
        }
        async fn invoke(
            &self,
            _arguments: serde_json::Value,
            _cx: &mut CapabilityContext<'_>,
        ) -> Result<CapabilityOutcome, CapabilityError> {
            Ok(CapabilityOutcome::Data(serde_json::json!(null)))
        }
    }

    #[test]
    fn duplicate_capability_names_replace() {
        let agent = AgentDefinition::new("sales", "Sell.", "gpt-4o-mini")
            .with_capability(Arc::new(NamedCapability("lookup")))
            .with_capability(Arc::new(NamedCapability("lookup")));
        assert_eq!(agent.capability_names(), vec!["lookup"]);
    }

    #[test]
    fn descriptors_are_cached_and_ordered() {
        let agent = AgentDefinition::new("sales", "Sell.", "gpt-4o-mini")
            .with_capability(Arc::new(NamedCapability("zeta")))
            .with_capability(Arc::new(NamedCapability("alpha")));

        let first = agent.descriptors();
        assert_eq!(first.len(), 2);
        // BTreeMap ordering: alphabetical by capability name.
        assert_eq!(first[0].name, "alpha");
        assert_eq!(first[1].name, "zeta");

        let second = agent.descriptors();
        assert_eq!(first, second);
    }

    #[test]
    fn registry_resolves_handles() {
        let mut registry = AgentRegistry::new();
        registry.register(AgentDefinition::new("router", "Route.", "gpt-4o-mini"));

        let handle = AgentHandle::new("router");
        assert!(registry.resolve(&handle).is_some());
        assert!(registry.resolve(&AgentHandle::new("ghost")).is_none());
        assert_eq!(registry.names(), vec!["router"]);
    }
}
