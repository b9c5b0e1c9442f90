//! Scripted completion services for tests.
//!
//! `SequentialMockService` replays a fixed response sequence so turn and
//! orchestration tests can drive multi-round conversations without a
//! network. Public because the integration tests use it too.

use std::sync::Mutex;

use async_trait::async_trait;

use baton_core::{
    CompletionRequest, CompletionResponse, CompletionService, Message, MessageToolCall,
    ProviderError, Usage,
};

enum Scripted {
    Respond(CompletionResponse),
    Fail(ProviderError),
}

/// A completion service that returns a scripted sequence of responses.
///
/// Each `complete` call consumes the next entry. Panics when the script
/// runs out, which in a test means the code under test made more
/// completion calls than expected.
pub struct SequentialMockService {
    script: Mutex<Vec<Scripted>>,
    call_count: Mutex<usize>,
}

impl SequentialMockService {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Scripted::Respond).collect()),
            call_count: Mutex::new(0),
        }
    }

    /// A service that answers once, in plain text.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// A service whose first call fails with the given error.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            script: Mutex::new(vec![Scripted::Fail(error)]),
            call_count: Mutex::new(0),
        }
    }

    /// Append a failure after the scripted responses.
    pub fn then_fail(self, error: ProviderError) -> Self {
        self.script.lock().unwrap().push(Scripted::Fail(error));
        self
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl CompletionService for SequentialMockService {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let script = self.script.lock().unwrap();

        if *count >= script.len() {
            panic!(
                "SequentialMockService: no scripted response for call #{} (have {})",
                *count + 1,
                script.len()
            );
        }

        let entry = &script[*count];
        *count += 1;
        match entry {
            Scripted::Respond(response) => Ok(response.clone()),
            Scripted::Fail(error) => Err(error.clone()),
        }
    }
}

/// A completion service whose requests never resolve, for exercising
/// the per-request deadline.
pub struct HangingService;

#[async_trait]
impl CompletionService for HangingService {
    fn name(&self) -> &str {
        "hanging_mock"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        std::future::pending().await
    }
}

/// A plain text response with token usage filled in.
pub fn make_text_response(text: &str) -> CompletionResponse {
    CompletionResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A response carrying tool calls and optional accompanying text.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, text: &str) -> CompletionResponse {
    let mut message = Message::assistant(text);
    message.tool_calls = tool_calls;
    CompletionResponse {
        message,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A tool call with a deterministic id derived from the name.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}
