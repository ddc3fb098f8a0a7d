//! Shared test helpers for loop and turn tests.

use persanna_core::error::{ProviderError, ToolError};
use persanna_core::message::{Message, MessageToolCall};
use persanna_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use persanna_core::tool::Tool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses
/// provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that returns a single plain text response.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// A provider that replies with one protocol blob per entry.
    pub fn actions(steps: &[(&str, &str)]) -> Self {
        Self::new(
            steps
                .iter()
                .map(|(action, input)| make_text_response(&action_reply(action, input)))
                .collect(),
        )
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();

        if count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                responses.len()
            );
        }

        requests.push(request);
        Ok(responses[count].clone())
    }
}

/// A provider that waits before answering every call.
pub struct SlowProvider {
    pub delay: Duration,
    pub reply: String,
}

#[async_trait::async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(make_text_response(&self.reply))
    }
}

/// A tool that sleeps before answering and flags when it got to finish.
pub struct SlowTool {
    pub delay: Duration,
    pub finished: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow-lookup"
    }

    fn description(&self) -> &str {
        "looks something up, slowly"
    }

    async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
        tokio::time::sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok("late result".into())
    }
}

/// A provider whose every call fails.
pub struct FailingProvider;

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

/// The fenced JSON blob a model would answer with.
pub fn action_reply(action: &str, input: &str) -> String {
    let blob = serde_json::json!({ "action": action, "action_input": input });
    format!("```json\n{}\n```", serde_json::to_string_pretty(&blob).unwrap())
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
        metadata: serde_json::Map::new(),
    }
}

/// Create a response with native tool calls and optional thought content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut response = make_text_response(thought);
    response.message.tool_calls = tool_calls;
    response
}

/// Helper to create a native tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{}", name),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}
