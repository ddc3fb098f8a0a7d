//! Agent executor: the Deciding → ExecutingTool loop.
//!
//! Each Deciding step sends the persona system prompt, the memory window,
//! the user's input (wrapped with the tool list and format instructions)
//! and the transcript so far. The reply is parsed into an [`AgentStep`]:
//! a final answer ends the run, a tool request runs exactly one tool and
//! loops back.
//!
//! # Termination
//!
//! - **Done**: the model gave a final answer.
//! - **Failed**: the iteration budget ran out, the deadline passed, the
//!   caller cancelled, the model call failed or its reply could not be
//!   parsed. None of these are retried.
//!
//! Tool failures and unknown tool names never end the run; they become
//! observations the model can react to.

use chrono::Utc;
use persanna_core::error::AgentError;
use persanna_core::event::{DomainEvent, EventBus, preview};
use persanna_core::message::Message;
use persanna_core::provider::{Provider, ProviderRequest};
use persanna_core::tool::ToolRegistry;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::accountant::UsageAccountant;
use crate::context::{MemoryWindow, TraceEntry, Transcript};
use crate::parser::{self, AgentStep, ToolInvocation};
use crate::prompt;

pub const DEFAULT_MAX_ITERATIONS: u32 = 15;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

enum LoopState {
    Deciding,
    ExecutingTool { call: ToolInvocation, reply: String },
    Done(String),
    Failed(AgentError),
}

pub struct AgentExecutor {
    provider: Arc<dyn Provider>,
    model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_iterations: u32,
    timeout: Duration,
    /// Also offer tools through the provider's native function calling.
    native_tools: bool,
    accountant: Option<Arc<UsageAccountant>>,
    event_bus: Option<Arc<EventBus>>,
}

/// The result of a completed run.
#[derive(Debug, Clone)]
pub struct ExecutorOutput {
    pub answer: String,
    /// Number of Deciding steps taken.
    pub iterations: u32,
    pub tool_calls_made: usize,
    pub trace: Vec<TraceEntry>,
}

impl AgentExecutor {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: system_prompt.into(),
            temperature: 0.7,
            max_tokens: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            timeout: DEFAULT_TIMEOUT,
            native_tools: false,
            accountant: None,
            event_bus: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set max iterations. Zero means the default.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = if max == 0 { DEFAULT_MAX_ITERATIONS } else { max };
        self
    }

    /// Set the wall-clock budget for the whole run. Zero means the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() { DEFAULT_TIMEOUT } else { timeout };
        self
    }

    pub fn with_native_tools(mut self, enabled: bool) -> Self {
        self.native_tools = enabled;
        self
    }

    pub fn with_accountant(mut self, accountant: Arc<UsageAccountant>) -> Self {
        self.accountant = Some(accountant);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the loop to completion.
    pub async fn run(
        &self,
        window: &MemoryWindow,
        tools: &ToolRegistry,
        input: &str,
    ) -> Result<ExecutorOutput, AgentError> {
        self.run_with_cancel(window, tools, input, &CancellationToken::new())
            .await
    }

    /// Run the loop, aborting when `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        window: &MemoryWindow,
        tools: &ToolRegistry,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<ExecutorOutput, AgentError> {
        let deadline = Instant::now() + self.timeout;
        let mut transcript = Transcript::new();
        let mut iterations = 0u32;
        let mut tool_calls_made = 0usize;
        let mut state = LoopState::Deciding;

        info!(
            model = %self.model,
            max_iter = self.max_iterations,
            timeout_ms = self.timeout_ms(),
            tools = tools.len(),
            history = window.len(),
            "Agent loop starting"
        );

        loop {
            state = match state {
                LoopState::Deciding => {
                    iterations += 1;
                    if iterations > self.max_iterations {
                        LoopState::Failed(AgentError::IterationLimit {
                            max_iterations: self.max_iterations,
                        })
                    } else if Instant::now() >= deadline {
                        LoopState::Failed(self.timeout_error())
                    } else {
                        debug!(iteration = iterations, "Deciding");
                        match self
                            .decide(window, tools, input, &transcript, deadline, cancel)
                            .await
                        {
                            Ok((AgentStep::FinalAnswer { text }, _)) => LoopState::Done(text),
                            Ok((AgentStep::ToolCall(call), reply)) => {
                                LoopState::ExecutingTool { call, reply }
                            }
                            Err(e) => LoopState::Failed(e),
                        }
                    }
                }

                LoopState::ExecutingTool { call, reply } => {
                    tool_calls_made += 1;
                    match self
                        .execute_tool(tools, call, &reply, &mut transcript, deadline, cancel)
                        .await
                    {
                        Ok(()) => LoopState::Deciding,
                        Err(e) => LoopState::Failed(e),
                    }
                }

                LoopState::Done(answer) => {
                    info!(
                        iterations,
                        tool_calls = tool_calls_made,
                        answer_len = answer.len(),
                        "Agent loop complete"
                    );
                    return Ok(ExecutorOutput {
                        answer,
                        iterations,
                        tool_calls_made,
                        trace: transcript.into_trace(),
                    });
                }

                LoopState::Failed(error) => {
                    warn!(iterations, tool_calls = tool_calls_made, "Agent loop failed: {error}");
                    return Err(error);
                }
            };
        }
    }

    /// One model call: returns the parsed step and the raw reply text.
    async fn decide(
        &self,
        window: &MemoryWindow,
        tools: &ToolRegistry,
        input: &str,
        transcript: &Transcript,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<(AgentStep, String), AgentError> {
        let mut messages = Vec::with_capacity(window.len() + transcript.messages().len() + 2);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(window.to_messages());
        messages.push(Message::user(prompt::render_input(tools, input)));
        messages.extend(transcript.messages().iter().cloned());

        let mut request = ProviderRequest::new(&self.model, messages);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        if self.native_tools {
            request.tools = tools.definitions();
        }

        let response = self
            .guarded(deadline, cancel, self.provider.complete(request))
            .await??;

        if let Some(accountant) = &self.accountant {
            accountant.record(&response.model, response.usage.as_ref());
        }

        let step = parser::parse_reply(&response.message)?;
        Ok((step, response.message.content))
    }

    async fn execute_tool(
        &self,
        tools: &ToolRegistry,
        call: ToolInvocation,
        reply: &str,
        transcript: &mut Transcript,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<(), AgentError> {
        if !call.thought.is_empty() {
            transcript.add_thought(&call.thought);
        }
        transcript.add_action(&call.tool_name, &call.tool_input);
        debug!(tool = %call.tool_name, input = %preview(&call.tool_input, 80), "Executing tool");

        let started = std::time::Instant::now();
        let result = self
            .guarded(
                deadline,
                cancel,
                tools.invoke(&call.tool_name, &call.tool_input),
            )
            .await?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let success = result.is_ok();
        let observation = match result {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %call.tool_name, "Tool failed: {e}");
                e.to_string()
            }
        };

        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ToolExecuted {
                tool_name: call.tool_name.clone(),
                success,
                duration_ms,
                timestamp: Utc::now(),
            });
        }

        transcript.add_observation(&observation);
        match call.native_call {
            Some(native) => transcript.record_native_exchange(reply, native, &observation),
            None => transcript.record_text_exchange(reply, &observation),
        }
        Ok(())
    }

    /// Await `fut` unless the deadline passes or the caller cancels first.
    /// A late result is dropped.
    async fn guarded<F: Future>(
        &self,
        deadline: Instant,
        cancel: &CancellationToken,
        fut: F,
    ) -> Result<F::Output, AgentError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            result = tokio::time::timeout_at(deadline, fut) => {
                result.map_err(|_| self.timeout_error())
            }
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn timeout_error(&self) -> AgentError {
        AgentError::Timeout {
            timeout_ms: self.timeout_ms(),
        }
    }
}
