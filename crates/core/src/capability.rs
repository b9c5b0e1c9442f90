//! Capability trait — the abstraction over what an agent can do.
//!
//! Capabilities give a specialist agent its verbs: look up product
//! knowledge, record extracted customer facts, or hand the conversation
//! to another agent. Each implementation declares an explicit typed
//! parameter list; there is no runtime signature introspection, so
//! descriptor building is total and deterministic.
//!
//! A capability's result is polymorphic over two shapes, distinguished
//! by type and never by sentinel text:
//!
//! - [`CapabilityOutcome::Data`] — an ordinary serializable value,
//!   stringified into the `tool` message.
//! - [`CapabilityOutcome::Handoff`] — an opaque [`AgentHandle`] meaning
//!   "control now belongs to that agent".

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::AgentHandle;
use crate::completion::ToolDescriptor;
use crate::error::CapabilityError;
use crate::profile::CustomerProfile;

/// The JSON-schema type of a declared parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParameterType {
    /// The fallback when nothing more specific is known.
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl ParameterType {
    fn schema_name(self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Integer => "integer",
            ParameterType::Number => "number",
            ParameterType::Boolean => "boolean",
            ParameterType::Array => "array",
            ParameterType::Object => "object",
            ParameterType::Null => "null",
        }
    }
}

/// One declared parameter of a capability.
///
/// A parameter without a default is required.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub ty: ParameterType,
    pub default: Option<Value>,
}

impl ParameterSpec {
    /// A parameter the model must always supply.
    pub fn required(name: impl Into<String>, description: impl Into<String>, ty: ParameterType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ty,
            default: None,
        }
    }

    /// A parameter with a default the model may omit.
    pub fn optional(
        name: impl Into<String>,
        description: impl Into<String>,
        ty: ParameterType,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ty,
            default: Some(default),
        }
    }
}

/// Per-invocation context passed into a capability.
///
/// The profile is the active agent's own copy, explicitly threaded
/// through every invocation — capabilities never reach for shared
/// mutable state.
pub struct CapabilityContext<'a> {
    /// Name of the agent whose turn is running.
    pub agent: &'a str,
    /// The active agent's profile copy, mutable for the duration of the
    /// call.
    pub profile: &'a mut CustomerProfile,
}

/// What a capability produced.
#[derive(Debug, Clone)]
pub enum CapabilityOutcome {
    /// An ordinary result, converted to text for the `tool` message.
    Data(Value),
    /// Control of the session should pass to this agent.
    Handoff(AgentHandle),
}

impl CapabilityOutcome {
    /// Text form for the `tool` message.
    pub fn to_tool_content(&self) -> String {
        match self {
            CapabilityOutcome::Data(Value::String(s)) => s.clone(),
            CapabilityOutcome::Data(value) => value.to_string(),
            CapabilityOutcome::Handoff(handle) => {
                format!("handoff acknowledged: control passed to {}", handle.name())
            }
        }
    }
}

/// The core Capability trait.
///
/// Implementations are registered on an agent at construction time and
/// shared via `Arc` across sessions, so they must be stateless apart
/// from what the context hands them.
#[async_trait]
pub trait Capability: Send + Sync {
    /// The unique name of this capability within an agent's set.
    fn name(&self) -> &str;

    /// A description of what this capability does (sent to the model).
    fn description(&self) -> &str;

    /// The declared parameter list.
    fn parameters(&self) -> Vec<ParameterSpec>;

    /// Invoke with parsed JSON arguments.
    async fn invoke(
        &self,
        arguments: Value,
        cx: &mut CapabilityContext<'_>,
    ) -> std::result::Result<CapabilityOutcome, CapabilityError>;
}

/// Build the descriptor sent to the completion service.
///
/// Pure and stable: the same capability always yields an identical
/// descriptor (`serde_json::Map` keeps keys sorted), which makes
/// descriptors cacheable per agent and comparable in tests. `required`
/// lists every parameter declared without a default, in declaration
/// order.
pub fn descriptor_for(capability: &dyn Capability) -> ToolDescriptor {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for param in capability.parameters() {
        let mut prop = serde_json::Map::new();
        prop.insert("type".into(), Value::String(param.ty.schema_name().into()));
        if !param.description.is_empty() {
            prop.insert("description".into(), Value::String(param.description.clone()));
        }
        if let Some(default) = &param.default {
            prop.insert("default".into(), default.clone());
        } else {
            required.push(Value::String(param.name.clone()));
        }
        properties.insert(param.name, Value::Object(prop));
    }

    let mut schema = serde_json::Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    schema.insert("required".into(), Value::Array(required));

    ToolDescriptor {
        name: capability.name().to_string(),
        description: capability.description().to_string(),
        parameters: Value::Object(schema),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct QuoteCapability;

    #[async_trait]
    impl Capability for QuoteCapability {
        fn name(&self) -> &str {
            "estimate_premium"
        }

        fn description(&self) -> &str {
            "Estimate a monthly premium for the given coverage level"
        }

        fn parameters(&self) -> Vec<ParameterSpec> {
            vec![
                ParameterSpec::required("coverage", "Coverage level", ParameterType::String),
                ParameterSpec::optional(
                    "term_months",
                    "Contract length",
                    ParameterType::Integer,
                    serde_json::json!(12),
                ),
            ]
        }

        async fn invoke(
            &self,
            arguments: Value,
            _cx: &mut CapabilityContext<'_>,
        ) -> Result<CapabilityOutcome, CapabilityError> {
            let coverage = arguments["coverage"].as_str().unwrap_or("standard");
            Ok(CapabilityOutcome::Data(serde_json::json!({
                "coverage": coverage,
                "monthly": 42_000,
            })))
        }
    }

    #[test]
    fn descriptor_separates_required_and_defaulted() {
        let descriptor = descriptor_for(&QuoteCapability);
        assert_eq!(descriptor.name, "estimate_premium");

        let required = descriptor.parameters["required"].as_array().unwrap();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "coverage");

        let term = &descriptor.parameters["properties"]["term_months"];
        assert_eq!(term["type"], "integer");
        assert_eq!(term["default"], 12);
    }

    #[test]
    fn descriptor_is_deterministic() {
        let first = descriptor_for(&QuoteCapability);
        let second = descriptor_for(&QuoteCapability);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn unknown_parameter_type_defaults_to_string() {
        assert_eq!(ParameterType::default().schema_name(), "string");
    }

    #[test]
    fn handoff_outcome_renders_acknowledgement() {
        let outcome = CapabilityOutcome::Handoff(AgentHandle::new("sales"));
        assert_eq!(
            outcome.to_tool_content(),
            "handoff acknowledged: control passed to sales"
        );
    }

    #[test]
    fn string_data_is_not_requoted() {
        let outcome = CapabilityOutcome::Data(Value::String("plain text".into()));
        assert_eq!(outcome.to_tool_content(), "plain text");
    }
}
