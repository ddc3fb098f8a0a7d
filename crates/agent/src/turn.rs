//! Turn controller: the entry point invoked once per user message.
//!
//! A turn formats the input, appends the human record to the session log,
//! builds the memory window and this turn's tools, runs the executor and
//! reports back. Failures never escape as errors: the host always gets text
//! to show, and a failed turn leaves no assistant record behind.

use chrono::Utc;
use persanna_config::AppConfig;
use persanna_core::error::AgentError;
use persanna_core::event::{DomainEvent, EventBus, preview};
use persanna_core::host::{Clock, DefaultFormatter, ResponseFormatter, SystemClock};
use persanna_core::message::{Speaker, StoredMessage};
use persanna_core::provider::Provider;
use persanna_core::session::SessionState;
use persanna_core::tool::ToolRegistry;
use persanna_tools::{ToolContext, build_tools};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::accountant::{MeteredProvider, UsageAccountant};
use crate::context::{MemoryWindow, WindowSettings};
use crate::executor::AgentExecutor;
use crate::prompt;

/// Prefix of the text returned for a failed turn.
pub const ERROR_PREFIX: &str = "An error occurred while fetching the response from the API: ";

/// Called with the full session log after every successful turn.
pub type CompletionHook = Box<dyn Fn(&[StoredMessage]) + Send + Sync>;

/// Builds the tool registry for a turn.
pub type ToolBuilder = Arc<dyn Fn(&ToolContext) -> ToolRegistry + Send + Sync>;

#[derive(Debug)]
pub enum TurnOutcome {
    Completed { elapsed: Duration, iterations: u32 },
    Failed { error: AgentError },
}

/// What the host shows for a turn, and how it went.
#[derive(Debug)]
pub struct TurnResult {
    pub text: String,
    pub outcome: TurnOutcome,
}

impl TurnResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TurnOutcome::Completed { .. })
    }
}

pub struct TurnController {
    provider: Arc<dyn Provider>,
    embedder: Arc<dyn Provider>,
    config: AppConfig,
    clock: Arc<dyn Clock>,
    formatter: Arc<dyn ResponseFormatter>,
    event_bus: Arc<EventBus>,
    on_complete: Option<CompletionHook>,
    tool_builder: ToolBuilder,
}

impl TurnController {
    pub fn new(provider: Arc<dyn Provider>, embedder: Arc<dyn Provider>, config: AppConfig) -> Self {
        Self {
            provider,
            embedder,
            config,
            clock: Arc::new(SystemClock),
            formatter: Arc::new(DefaultFormatter),
            event_bus: Arc::new(EventBus::default()),
            on_complete: None,
            tool_builder: Arc::new(build_tools),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn ResponseFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Persistence callback, run once per successful turn.
    pub fn on_complete(mut self, hook: impl Fn(&[StoredMessage]) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Replace the built-in tool set.
    pub fn with_tool_builder(
        mut self,
        builder: impl Fn(&ToolContext) -> ToolRegistry + Send + Sync + 'static,
    ) -> Self {
        self.tool_builder = Arc::new(builder);
        self
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn run_turn(&self, session: &mut SessionState, user_text: &str) -> TurnResult {
        self.run_turn_with_cancel(session, user_text, &CancellationToken::new())
            .await
    }

    pub async fn run_turn_with_cancel(
        &self,
        session: &mut SessionState,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> TurnResult {
        let started = Instant::now();
        let input = self.formatter.format(user_text);

        session
            .messages
            .push(StoredMessage::human(&input, self.clock.time_string()));
        self.publish_appended(Speaker::Human, &input);

        // The current input reaches the model separately from the history.
        let history = &session.messages[..session.messages.len() - 1];
        let agent = &self.config.agent;
        let window = MemoryWindow::from_history(
            history,
            &WindowSettings::new(agent.history_limit, agent.window_size),
        );

        let model = if session.model.is_empty() {
            self.config.default_model.clone()
        } else {
            session.model.clone()
        };

        let accountant = Arc::new(
            UsageAccountant::new(session.usage.clone()).with_event_bus(self.event_bus.clone()),
        );

        let tools = (self.tool_builder)(&ToolContext {
            provider: Arc::new(MeteredProvider::new(
                self.provider.clone(),
                accountant.clone(),
            )),
            model: model.clone(),
            embedder: self.embedder.clone(),
            embedding_model: self.config.embeddings.model.clone(),
            active_tab: session.active_tab.clone(),
            persona: self.config.persona.clone(),
            clock: self.clock.clone(),
            browser: self.config.browser.clone(),
        });

        let executor = AgentExecutor::new(
            self.provider.clone(),
            &model,
            prompt::system_prompt(&self.config.persona),
        )
        .with_temperature(self.config.default_temperature)
        .with_max_tokens(self.config.default_max_tokens)
        .with_max_iterations(session.effective_max_iterations(agent.max_iterations))
        .with_timeout(Duration::from_secs(
            session.effective_timeout_secs(agent.timeout_secs),
        ))
        .with_native_tools(agent.native_tools)
        .with_accountant(accountant)
        .with_event_bus(self.event_bus.clone());

        match executor.run_with_cancel(&window, &tools, &input, cancel).await {
            Ok(output) => {
                session
                    .messages
                    .push(StoredMessage::ai(&output.answer, self.clock.time_string()));
                self.publish_appended(Speaker::Assistant, &output.answer);

                if let Some(hook) = &self.on_complete {
                    hook(&session.messages);
                }

                let elapsed = started.elapsed();
                self.event_bus.publish(DomainEvent::TurnCompleted {
                    iterations: output.iterations,
                    elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    timestamp: Utc::now(),
                });
                info!(
                    iterations = output.iterations,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Turn complete"
                );

                TurnResult {
                    text: output.answer,
                    outcome: TurnOutcome::Completed {
                        elapsed,
                        iterations: output.iterations,
                    },
                }
            }
            Err(error) => {
                warn!("Turn failed: {error}");
                self.event_bus.publish(DomainEvent::TurnFailed {
                    error_message: error.to_string(),
                    timestamp: Utc::now(),
                });
                TurnResult {
                    text: format!("{ERROR_PREFIX}{error}"),
                    outcome: TurnOutcome::Failed { error },
                }
            }
        }
    }

    fn publish_appended(&self, speaker: Speaker, content: &str) {
        self.event_bus.publish(DomainEvent::MessageAppended {
            speaker,
            content_preview: preview(content, 100),
            timestamp: Utc::now(),
        });
    }
}
