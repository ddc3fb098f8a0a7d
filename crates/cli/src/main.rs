//! Persanna CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Create the config directory and a default config
//! - `chat`: Interactive chat or single-message mode
//! - `tools`: List the assistant's tools
//! - `usage`: Show cumulative token usage
//! - `config`: Show, locate or validate the configuration
//! - `doctor`: Diagnose setup problems

use clap::{Parser, Subcommand};

mod commands;
mod store;

#[derive(Parser)]
#[command(
    name = "persanna",
    about = "Persanna — a tool-using conversational assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Chat with the assistant
    Chat(commands::chat::ChatArgs),

    /// List the tools available to the assistant
    Tools,

    /// Show cumulative token usage for the saved session
    Usage {
        /// Clear the saved history and counters
        #[arg(long)]
        reset: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose setup problems
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Validate the config file
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat(args) => commands::chat::run(args).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Usage { reset } => commands::usage::run(reset).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
