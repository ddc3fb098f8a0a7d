//! Error types for the Persanna domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// A failure inside a single tool invocation.
///
/// Tool errors never abort a turn: the agent loop turns them into an
/// observation the model can react to.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("{0} is not a valid tool, try another one.")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid input for {tool_name}: {reason}")]
    InvalidInput { tool_name: String, reason: String },
}

impl ToolError {
    /// Shorthand for an execution failure.
    pub fn failed(tool_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for an input validation failure.
    pub fn invalid(tool_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            tool_name: tool_name.into(),
            reason: reason.to_string(),
        }
    }

    /// The tool this error belongs to.
    pub fn tool_name(&self) -> &str {
        match self {
            Self::NotFound(name) => name,
            Self::ExecutionFailed { tool_name, .. } | Self::InvalidInput { tool_name, .. } => {
                tool_name
            }
        }
    }
}

/// Errors that end a reasoning loop run.
///
/// Every variant is fatal for the current turn; the turn controller renders
/// it as text for the host.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Model call failed: {0}")]
    ModelCall(#[from] ProviderError),

    #[error("Agent stopped due to iteration limit ({max_iterations})")]
    IterationLimit { max_iterations: u32 },

    #[error("Agent stopped due to timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Could not parse LLM output: {0}")]
    Parse(String),

    #[error("Turn was cancelled")]
    Cancelled,
}

impl AgentError {
    /// Whether this error comes from running out of iterations or time.
    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, Self::IterationLimit { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = AgentError::from(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_error_carries_tool_name() {
        let err = ToolError::failed("web-browser", "connection refused");
        assert_eq!(err.tool_name(), "web-browser");
        assert_eq!(
            err.to_string(),
            "Tool execution failed: web-browser: connection refused"
        );

        let missing = ToolError::NotFound("search".into());
        assert_eq!(missing.tool_name(), "search");
        assert!(missing.to_string().contains("not a valid tool"));
    }

    #[test]
    fn budget_errors_are_classified() {
        assert!(AgentError::IterationLimit { max_iterations: 3 }.is_budget_exceeded());
        assert!(AgentError::Timeout { timeout_ms: 30_000 }.is_budget_exceeded());
        assert!(!AgentError::Parse("garbage".into()).is_budget_exceeded());
        assert!(!AgentError::Cancelled.is_budget_exceeded());
    }

    #[test]
    fn model_call_error_wraps_provider_error() {
        let err: AgentError = ProviderError::AuthenticationFailed("bad key".into()).into();
        assert!(matches!(err, AgentError::ModelCall(_)));
        assert!(err.to_string().contains("bad key"));
    }
}
