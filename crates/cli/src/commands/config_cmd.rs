//! `persanna config`: Configuration management commands.

use persanna_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            if config.has_api_key() {
                println!("   ✅ API key available");
            } else {
                println!("   ⚠️  No API key set (set PERSANNA_API_KEY or OPENAI_API_KEY)");
            }

            println!();
            println!("   Provider:    {}", config.default_provider);
            println!("   Model:       {}", config.default_model);
            println!("   Embeddings:  {}", config.embeddings.model);
            println!("   Persona:     {}", config.persona.name);
            println!(
                "   Budget:      {} iterations / {}s per turn",
                config.agent.max_iterations, config.agent.timeout_secs
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if config.api_key.is_some() {
        config.api_key = Some("***".into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some("***".into());
        }
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = persanna_config::AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains("config.toml"));
    }
}
