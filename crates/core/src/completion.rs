//! CompletionService trait — the abstraction over the LLM inference
//! endpoint.
//!
//! The execution loop sends the active agent's instructions, the session
//! history, and the capability descriptors; the service returns one
//! assistant message, optionally carrying tool calls. Transport is a
//! provider concern — the core only requires the response to conform to
//! the [`Message`]/[`MessageToolCall`] shapes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;

/// A request to the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// Instructions + session history, system message first
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Capability descriptors the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A capability descriptor sent to the completion service.
///
/// `parameters` is a JSON Schema object; its `required` array lists every
/// parameter declared without a default. Built by
/// [`crate::capability::descriptor_for`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A complete response from the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated assistant message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The completion-service trait.
///
/// Every backend (OpenAI-compatible endpoints, test mocks) implements
/// this. The execution loop calls `complete()` without knowing which
/// backend is in use.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// A human-readable name for this service (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_without_empty_fields() {
        let req = CompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![Message::system("You are a router.")],
            temperature: default_temperature(),
            max_tokens: None,
            tools: vec![],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("\"tools\""));
    }

    #[test]
    fn descriptor_equality_is_structural() {
        let a = ToolDescriptor {
            name: "transfer_to_sales".into(),
            description: "Hand the conversation to the sales agent".into(),
            parameters: serde_json::json!({"type": "object", "properties": {}, "required": []}),
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
