//! Configuration loading, validation, and management for Persanna.
//!
//! Loads configuration from `~/.persanna/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.persanna/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Reasoning loop budgets and memory window caps
    #[serde(default)]
    pub agent: AgentConfig,

    /// Who the assistant is
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Embedding model used to rank page content
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    /// Web browser tool settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("persona", &self.persona)
            .field("embeddings", &self.embeddings)
            .field("browser", &self.browser)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Decision cycles allowed per turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Wall-clock budget per turn, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Raw host records considered before building the window
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum turns in the memory window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Also offer tools through the provider's native function calling
    #[serde(default)]
    pub native_tools: bool,
}

fn default_max_iterations() -> u32 {
    15
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_history_limit() -> usize {
    42
}
fn default_window_size() -> usize {
    512
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            timeout_secs: default_timeout_secs(),
            history_limit: default_history_limit(),
            window_size: default_window_size(),
            native_tools: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_persona_name")]
    pub name: String,

    #[serde(default = "default_persona_age")]
    pub age: u32,

    #[serde(default = "default_persona_role")]
    pub role: String,

    #[serde(default = "default_built_by")]
    pub built_by: String,

    #[serde(default = "default_tone")]
    pub tone: String,

    #[serde(default = "default_powered_by")]
    pub powered_by: String,

    #[serde(default = "default_likes")]
    pub likes: String,

    #[serde(default = "default_temperament")]
    pub temperament: String,

    /// Override the system prompt entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_persona_name() -> String {
    "Persanna".into()
}
fn default_persona_age() -> u32 {
    23
}
fn default_persona_role() -> String {
    "Assistant".into()
}
fn default_built_by() -> String {
    "Moikas LLC and Collaborators".into()
}
fn default_tone() -> String {
    "a Creative Tone and Emojis".into()
}
fn default_powered_by() -> String {
    "OpenAI API and LangChain".into()
}
fn default_likes() -> String {
    "Anime, Manga, and Video Games, and Dogs".into()
}
fn default_temperament() -> String {
    "I'm normally Happy, but rude comments will make me sad.".into()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            age: default_persona_age(),
            role: default_persona_role(),
            built_by: default_built_by(),
            tone: default_tone(),
            powered_by: default_powered_by(),
            likes: default_likes(),
            temperament: default_temperament(),
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// Provider serving embeddings; the default provider when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".into()
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Page text beyond this many characters is ignored
    #[serde(default = "default_max_page_chars")]
    pub max_page_chars: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks handed to the summarizer
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Links appended to the summary
    #[serde(default = "default_max_links")]
    pub max_links: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
}

fn default_max_page_chars() -> usize {
    100_000
}
fn default_chunk_size() -> usize {
    2000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_top_k() -> usize {
    4
}
fn default_max_links() -> usize {
    5
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_summary_max_tokens() -> u32 {
    512
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            max_page_chars: default_max_page_chars(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            max_links: default_max_links(),
            request_timeout_secs: default_request_timeout_secs(),
            summary_max_tokens: default_summary_max_tokens(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.persanna/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `PERSANNA_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    /// - `OPENROUTER_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("PERSANNA_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("PERSANNA_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("PERSANNA_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".persanna")
    }

    /// Where the CLI keeps the conversation log between runs.
    pub fn history_path() -> PathBuf {
        Self::config_dir().join("history.json")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.history_limit == 0 || self.agent.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "agent.history_limit and agent.window_size must be > 0".into(),
            ));
        }

        if self.browser.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "browser.chunk_size must be > 0".into(),
            ));
        }

        if self.browser.chunk_overlap >= self.browser.chunk_size {
            return Err(ConfigError::ValidationError(
                "browser.chunk_overlap must be smaller than browser.chunk_size".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            persona: PersonaConfig::default(),
            embeddings: EmbeddingsConfig::default(),
            browser: BrowserConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.default_model, "gpt-3.5-turbo");
        assert_eq!(config.agent.max_iterations, 15);
        assert_eq!(config.agent.timeout_secs, 30);
        assert_eq!(config.agent.history_limit, 42);
        assert_eq!(config.agent.window_size, 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.agent.window_size, config.agent.window_size);
        assert_eq!(parsed.persona.name, "Persanna");
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_window_rejected() {
        let mut config = AppConfig::default();
        config.agent.window_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut config = AppConfig::default();
        config.browser.chunk_overlap = config.browser.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_model = "gpt-4o-mini"

[agent]
max_iterations = 3

[persona]
name = "Ada"

[providers.openrouter]
api_key = "sk-or-test"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.agent.timeout_secs, 30);
        assert_eq!(config.persona.name, "Ada");
        assert_eq!(config.persona.age, 23);
        assert!(config.providers.contains_key("openrouter"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_model = [").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_redacts_api_keys() {
        let mut config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-nested".into()),
                api_url: None,
                default_model: None,
            },
        );
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("sk-nested"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-3.5-turbo"));
        assert!(toml_str.contains("[agent]"));
        assert!(toml_str.contains("[persona]"));
    }
}
