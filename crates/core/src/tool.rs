//! Tool trait: the abstraction over assistant capabilities.
//!
//! Tools give the assistant the ability to act beyond the model: browse a
//! page, do arithmetic, read the clock, inspect the active tab. Every tool
//! takes a single string argument and yields a string observation.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use std::sync::Arc;

/// The core Tool trait.
///
/// Tools are registered in a [`ToolRegistry`] that is rebuilt for every
/// turn, so implementations may capture turn-specific state.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator", "date-time").
    fn name(&self) -> &str;

    /// A description of when the tool applies (sent to the LLM).
    fn description(&self) -> &str;

    /// Invoke the tool with its single string argument.
    async fn invoke(&self, input: &str) -> std::result::Result<String, ToolError>;

    /// JSON Schema for native function calling: one string field, `input`.
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "The tool input"
                }
            },
            "required": ["input"]
        })
    }

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// An ordered registry of available tools.
///
/// Registration order is kept so the tool list rendered into the prompt is
/// stable from one turn to the next.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Invoke a tool by name. Unknown names yield [`ToolError::NotFound`].
    pub async fn invoke(&self, name: &str, input: &str) -> std::result::Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.invoke(input).await
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        async fn invoke(&self, input: &str) -> std::result::Result<String, ToolError> {
            Ok(input.to_string())
        }
    }

    struct LoudEcho;

    #[async_trait]
    impl Tool for LoudEcho {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input, loudly"
        }
        async fn invoke(&self, input: &str) -> std::result::Result<String, ToolError> {
            Ok(input.to_uppercase())
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        async fn invoke(&self, _input: &str) -> std::result::Result<String, ToolError> {
            Err(ToolError::failed("broken", "boom"))
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_keeps_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Broken));
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.names(), vec!["broken", "echo"]);
    }

    #[tokio::test]
    async fn registry_replaces_same_name_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(Broken));
        registry.register(Arc::new(LoudEcho));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["echo", "broken"]);
        assert_eq!(registry.invoke("echo", "hi").await.unwrap(), "HI");
    }

    #[test]
    fn registry_definitions_use_single_input_schema() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].parameters["required"], serde_json::json!(["input"]));
    }

    #[tokio::test]
    async fn registry_invoke_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let out = registry.invoke("echo", "hello world").await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn registry_invoke_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry.invoke("nonexistent", "").await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn registry_surfaces_tool_failure() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Broken));
        let err = registry.invoke("broken", "x").await.unwrap_err();
        assert_eq!(err.tool_name(), "broken");
    }
}
