//! Active tab tool: reports the browser tab the user is looking at.

use async_trait::async_trait;
use persanna_core::error::ToolError;
use persanna_core::tool::Tool;

pub struct ActiveTabTool {
    active_tab: Option<String>,
}

impl ActiveTabTool {
    pub fn new(active_tab: Option<String>) -> Self {
        Self { active_tab }
    }
}

#[async_trait]
impl Tool for ActiveTabTool {
    fn name(&self) -> &str {
        "acitve-tab-url-website-page"
    }

    fn description(&self) -> &str {
        "The value can be used to open a new tab, to summarize or to get the current URL/Tab/Website."
    }

    async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
        let url = self.active_tab.as_deref().unwrap_or("unknown");
        Ok(format!("Current URL/Tab/Website/page:{url}"))
    }
}
