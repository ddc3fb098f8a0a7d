//! `persanna usage`: Cumulative token usage of the saved session.

use crate::store;
use persanna_config::AppConfig;

pub async fn run(reset: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let path = AppConfig::history_path();

    if reset {
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        println!("🧹 Saved history and usage cleared");
        return Ok(());
    }

    let session = store::load_session(&path, &config.default_model)?;
    let totals = session.usage.snapshot();

    println!("📊 Usage");
    println!("─────────────────────────────────────");
    println!("  Model:              {}", session.model);
    println!("  Messages:           {}", session.messages.len());
    println!("  Prompt tokens:      {}", totals.prompt_tokens);
    println!("  Completion tokens:  {}", totals.completion_tokens);
    println!("  Total tokens:       {}", totals.total_tokens);

    Ok(())
}
