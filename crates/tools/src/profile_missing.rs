//! Reports which critical profile fields are still unknown.
//!
//! Specialist agents call this before recommending anything: a quote
//! without age or driving experience is a guess, so the instructions
//! tell the model to check here first and ask the customer instead.

use async_trait::async_trait;
use serde_json::{Value, json};

use baton_core::{
    Capability, CapabilityContext, CapabilityError, CapabilityOutcome, ParameterSpec,
};

pub struct MissingInfoCapability;

#[async_trait]
impl Capability for MissingInfoCapability {
    fn name(&self) -> &str {
        "missing_customer_info"
    }

    fn description(&self) -> &str {
        "List the critical customer fields that are still unknown. Call this before making a recommendation; if any field is listed, ask the customer about it first."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        Vec::new()
    }

    async fn invoke(
        &self,
        _arguments: Value,
        cx: &mut CapabilityContext<'_>,
    ) -> Result<CapabilityOutcome, CapabilityError> {
        let missing = cx.profile.missing_critical();
        let complete = missing.is_empty();
        Ok(CapabilityOutcome::Data(json!({
            "complete": complete,
            "missing": missing,
            "known": cx.profile.summary(),
        })))
    }
}
