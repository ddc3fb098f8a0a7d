//! Date/time tool: reads the host clock.

use async_trait::async_trait;
use persanna_core::error::ToolError;
use persanna_core::host::Clock;
use persanna_core::tool::Tool;
use std::sync::Arc;

pub struct DateTimeTool {
    clock: Arc<dyn Clock>,
}

impl DateTimeTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Tool for DateTimeTool {
    fn name(&self) -> &str {
        "date-time"
    }

    fn description(&self) -> &str {
        "call this to get the value to get the date and tme"
    }

    async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
        Ok(format!(
            " Date: {};  Time: {};",
            self.clock.date_string(),
            self.clock.time_string()
        ))
    }
}
