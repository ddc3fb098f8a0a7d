//! `persanna tools`: List the assistant's tools.

use persanna_config::AppConfig;
use persanna_core::host::SystemClock;
use persanna_tools::{ToolContext, build_tools};
use std::sync::Arc;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let router = persanna_providers::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;
    let embedder = router.embedder().ok_or("No embedding provider configured")?;

    let registry = build_tools(&ToolContext {
        provider,
        model: config.default_model.clone(),
        embedder,
        embedding_model: config.embeddings.model.clone(),
        active_tab: None,
        persona: config.persona.clone(),
        clock: Arc::new(SystemClock),
        browser: config.browser.clone(),
    });

    println!("🧰 Tools ({})", registry.len());
    println!("==========");
    for def in registry.definitions() {
        println!();
        println!("  {}", def.name);
        println!("    {}", def.description);
    }

    Ok(())
}
