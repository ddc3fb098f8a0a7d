//! Provider router: selects the correct LLM provider based on config.
//!
//! Handles provider creation and picks the backends used for reasoning
//! and for embeddings.

use crate::openai_compat::OpenAiCompatProvider;
use persanna_config::AppConfig;
use persanna_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
    embedding_provider: Option<String>,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
            embedding_provider: None,
        }
    }

    /// Serve embeddings from a different provider than the default.
    pub fn with_embedding_provider(mut self, name: impl Into<String>) -> Self {
        self.embedding_provider = Some(name.into());
        self
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// The provider used for embeddings, falling back to the default.
    pub fn embedder(&self) -> Option<Arc<dyn Provider>> {
        self.embedding_provider
            .as_deref()
            .and_then(|name| self.get(name))
            .or_else(|| self.default())
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);
    if let Some(name) = &config.embeddings.provider {
        router = router.with_embedding_provider(name);
    }

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        tracing::debug!(provider = %name, base_url = %base_url, "Registering provider");
        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if router.get(&config.default_provider).is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        let base_url = default_base_url(&config.default_provider);
        router.register(
            config.default_provider.clone(),
            Arc::new(OpenAiCompatProvider::new(
                &config.default_provider,
                &base_url,
                &api_key,
            )),
        );
    }

    router
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "fireworks" => "https://api.fireworks.ai/inference/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persanna_config::ProviderConfig;

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("openrouter");
        let provider = Arc::new(OpenAiCompatProvider::openrouter("sk-test"));
        router.register("openrouter", provider);

        assert!(router.get("openrouter").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let router = build_from_config(&config);
        assert!(router.default().is_some());
        assert_eq!(router.list(), vec!["openai"]);
        assert_eq!(router.embedder().unwrap().name(), "openai");
    }

    #[test]
    fn embedder_uses_configured_provider() {
        let mut config = AppConfig {
            default_provider: "openrouter".into(),
            ..AppConfig::default()
        };
        config.embeddings.provider = Some("openai".into());
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-embed".into()),
                api_url: None,
                default_model: None,
            },
        );

        let router = build_from_config(&config);
        assert_eq!(router.list(), vec!["openai", "openrouter"]);
        assert_eq!(router.default().unwrap().name(), "openrouter");
        assert_eq!(router.embedder().unwrap().name(), "openai");
    }

    #[test]
    fn embedder_falls_back_when_unknown() {
        let router = ProviderRouter::new("openai").with_embedding_provider("missing");
        assert!(router.embedder().is_none());

        let mut router = ProviderRouter::new("openai").with_embedding_provider("missing");
        router.register("openai", Arc::new(OpenAiCompatProvider::openai("k")));
        assert_eq!(router.embedder().unwrap().name(), "openai");
    }
}
