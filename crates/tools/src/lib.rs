//! Built-in tool implementations for Persanna.
//!
//! Tools give the assistant the ability to act beyond the model: read a
//! web page, do arithmetic, check the clock, look at the active browser
//! tab and describe itself.
//!
//! The registry is rebuilt for every turn by [`build_tools`], so tools
//! capture turn-scoped state (the active tab, the clock) explicitly
//! through [`ToolContext`] rather than reading it from shared state.

pub mod active_tab;
pub mod calculator;
pub mod date_time;
pub mod persona;
pub mod web_browser;

use persanna_config::{BrowserConfig, PersonaConfig};
use persanna_core::host::Clock;
use persanna_core::provider::Provider;
use persanna_core::tool::ToolRegistry;
use std::sync::Arc;

pub use active_tab::ActiveTabTool;
pub use calculator::CalculatorTool;
pub use date_time::DateTimeTool;
pub use persona::PersonaTool;
pub use web_browser::WebBrowserTool;

/// Everything a turn's tools may close over.
#[derive(Clone)]
pub struct ToolContext {
    /// Model used by tools that call the LLM themselves
    pub provider: Arc<dyn Provider>,
    pub model: String,

    /// Backend used to rank retrieved content
    pub embedder: Arc<dyn Provider>,
    pub embedding_model: String,

    /// URL of the tab the user is looking at
    pub active_tab: Option<String>,

    pub persona: PersonaConfig,
    pub clock: Arc<dyn Clock>,
    pub browser: BrowserConfig,
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("embedder", &self.embedder.name())
            .field("embedding_model", &self.embedding_model)
            .field("active_tab", &self.active_tab)
            .field("persona", &self.persona.name)
            .finish()
    }
}

/// Build this turn's tool registry.
///
/// Order is fixed: web browser, calculator, active tab, date/time, persona.
pub fn build_tools(ctx: &ToolContext) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WebBrowserTool::new(
        ctx.provider.clone(),
        &ctx.model,
        ctx.embedder.clone(),
        &ctx.embedding_model,
        ctx.browser.clone(),
    )));
    registry.register(Arc::new(CalculatorTool));
    registry.register(Arc::new(ActiveTabTool::new(ctx.active_tab.clone())));
    registry.register(Arc::new(DateTimeTool::new(ctx.clock.clone())));
    registry.register(Arc::new(PersonaTool::new(&ctx.persona)));
    registry
}
