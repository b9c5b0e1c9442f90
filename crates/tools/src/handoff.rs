//! Handoff capability — the typed signal that moves a conversation.
//!
//! One instance is generated per edge in the roster graph, named
//! `transfer_to_{target}` so the model can pick the destination by tool
//! name alone. Invoking it never touches the session; it merely returns
//! [`CapabilityOutcome::Handoff`] and leaves the orchestrator to act on
//! it after the round completes.

use async_trait::async_trait;
use serde_json::Value;

use baton_core::{
    AgentHandle, Capability, CapabilityContext, CapabilityError, CapabilityOutcome, ParameterSpec,
};

pub struct HandoffCapability {
    name: String,
    description: String,
    target: AgentHandle,
}

impl HandoffCapability {
    /// A handoff to `target`. The description tells the model when this
    /// destination is the right one.
    pub fn to(target: impl Into<String>, description: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            name: format!("transfer_to_{target}"),
            description: description.into(),
            target: AgentHandle::new(target),
        }
    }

    pub fn target(&self) -> &AgentHandle {
        &self.target
    }
}

#[async_trait]
impl Capability for HandoffCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        Vec::new()
    }

    async fn invoke(
        &self,
        _arguments: Value,
        cx: &mut CapabilityContext<'_>,
    ) -> Result<CapabilityOutcome, CapabilityError> {
        tracing::debug!(from = cx.agent, to = %self.target, "Handoff requested");
        Ok(CapabilityOutcome::Handoff(self.target.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_core::{CustomerProfile, descriptor_for};

    #[tokio::test]
    async fn invoke_returns_handoff_outcome() {
        let capability = HandoffCapability::to("sales", "Transfer to the sales consultant");
        let mut profile = CustomerProfile::default();
        let mut cx = CapabilityContext {
            agent: "router",
            profile: &mut profile,
        };

        let outcome = capability
            .invoke(serde_json::json!({}), &mut cx)
            .await
            .unwrap();
        match outcome {
            CapabilityOutcome::Handoff(handle) => assert_eq!(handle.name(), "sales"),
            CapabilityOutcome::Data(_) => panic!("expected a handoff"),
        }
    }

    #[test]
    fn name_encodes_the_target() {
        let capability = HandoffCapability::to("knowledge", "Transfer to the knowledge expert");
        assert_eq!(capability.name(), "transfer_to_knowledge");
        assert_eq!(capability.target().name(), "knowledge");
    }

    #[test]
    fn descriptor_has_no_required_parameters() {
        let capability = HandoffCapability::to("general", "Transfer to general support");
        let descriptor = descriptor_for(&capability);
        assert_eq!(descriptor.parameters["required"].as_array().unwrap().len(), 0);
        assert!(
            descriptor.parameters["properties"]
                .as_object()
                .unwrap()
                .is_empty()
        );
    }
}
