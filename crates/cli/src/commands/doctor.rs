//! `persanna doctor`: Diagnose setup problems.

use crate::store;
use persanna_config::AppConfig;
use persanna_providers::ProviderRouter;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Persanna Doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;
    let mut default_model = AppConfig::default().default_model;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — defaults in use (run `persanna onboard`)");
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            if config.has_api_key() || config.providers.values().any(|p| p.api_key.is_some()) {
                println!("  ✅ API key configured");
                let router = persanna_providers::build_from_config(&config);
                issues += check_providers(&router).await;
            } else {
                println!("  ⚠️  No API key configured — set PERSANNA_API_KEY or add api_key to config.toml");
                issues += 1;
            }
            default_model = config.default_model;
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            issues += 1;
        }
    }

    let history_path = AppConfig::history_path();
    if history_path.exists() {
        match store::load_session(&history_path, &default_model) {
            Ok(session) => println!(
                "  ✅ Saved history readable ({} messages)",
                session.messages.len()
            ),
            Err(e) => {
                println!("  ❌ {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ✅ No saved history yet");
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Probe every registered provider. Returns the number that failed.
async fn check_providers(router: &ProviderRouter) -> usize {
    let mut failed = 0;
    for name in router.list() {
        let Some(provider) = router.get(name) else {
            continue;
        };
        match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider '{name}' reachable"),
            Ok(false) => {
                println!("  ❌ Provider '{name}' rejected the request (check the API key)");
                failed += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{name}' unreachable: {e}");
                failed += 1;
            }
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use persanna_core::error::ProviderError;
    use persanna_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use std::sync::Arc;

    struct Health(Result<bool, ProviderError>);

    #[async_trait]
    impl Provider for Health {
        fn name(&self) -> &str {
            "health"
        }

        async fn complete(&self, _: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("health".into()))
        }

        async fn health_check(&self) -> Result<bool, ProviderError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn counts_unhealthy_providers() {
        let mut router = ProviderRouter::new("openai");
        router.register("openai", Arc::new(Health(Ok(true))));
        router.register("openrouter", Arc::new(Health(Ok(false))));
        router.register("local", Arc::new(Health(Err(ProviderError::Network("refused".into())))));

        assert_eq!(check_providers(&router).await, 2);
    }

    #[tokio::test]
    async fn healthy_router_has_no_issues() {
        let mut router = ProviderRouter::new("openai");
        router.register("openai", Arc::new(Health(Ok(true))));
        assert_eq!(check_providers(&router).await, 0);
    }
}
