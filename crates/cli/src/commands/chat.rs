//! `persanna chat`: Interactive or single-message chat mode.

use crate::store;
use persanna_agent::TurnController;
use persanna_config::AppConfig;
use persanna_core::message::StoredMessage;
use persanna_core::session::SessionState;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(clap::Args)]
pub struct ChatArgs {
    /// Send a single message instead of entering interactive mode
    #[arg(short, long)]
    pub message: Option<String>,

    /// URL of the page the assistant should treat as the active tab
    #[arg(long)]
    pub tab: Option<String>,

    /// Override the model for this session
    #[arg(long, env = "PERSANNA_CHAT_MODEL")]
    pub model: Option<String>,

    /// Decision cycles allowed per turn (0 = configured default)
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Seconds allowed per turn (0 = configured default)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Start from an empty history and leave the saved one untouched
    #[arg(long)]
    pub fresh: bool,
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() && config.providers.values().all(|p| p.api_key.is_none()) {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    PERSANNA_API_KEY    = 'sk-...'        (generic)");
        eprintln!("    OPENAI_API_KEY      = 'sk-...'        (for OpenAI direct)");
        eprintln!("    OPENROUTER_API_KEY  = 'sk-or-v1-...'  (for OpenRouter)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = persanna_providers::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;
    let embedder = router.embedder().ok_or("No embedding provider configured")?;

    let history_path = (!args.fresh).then(AppConfig::history_path);
    let mut session = match &history_path {
        Some(path) => store::load_session(path, &config.default_model)?,
        None => SessionState::new(&config.default_model),
    };
    if let Some(model) = args.model {
        session.model = model;
    }
    session.active_tab = args.tab;
    session.max_iterations = args.max_iterations;
    session.timeout_secs = args.timeout;

    let provider_name = config.default_provider.clone();
    let controller = attach_persistence(
        TurnController::new(provider, embedder, config),
        history_path.clone(),
        &session,
    );

    if let Some(msg) = args.message {
        eprint!("  Thinking...");
        let result = controller.run_turn(&mut session, &msg).await;
        eprint!("\r              \r");
        println!("{}", result.text);
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Persanna — Interactive Mode           ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {provider_name}");
    println!("  Model:     {}", session.model);
    println!("  History:   {} messages", session.messages.len());
    if let Some(tab) = &session.active_tab {
        println!("  Tab:       {tab}");
    }
    println!();
    println!("  Type your message and press Enter.");
    println!("  /usage shows token usage, /clear forgets the history.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let line = line.trim();

        match line {
            "" => continue,
            "exit" | "quit" | "/exit" | "/quit" | ":q" => break,
            "/usage" => {
                let totals = session.usage.snapshot();
                println!(
                    "  prompt {} · completion {} · total {}",
                    totals.prompt_tokens, totals.completion_tokens, totals.total_tokens
                );
                println!();
                continue;
            }
            "/clear" => {
                session.messages.clear();
                if let Some(path) = &history_path {
                    if let Err(e) = store::save_session(path, &session) {
                        eprintln!("  [Error] {e}");
                    }
                }
                println!("  History cleared.");
                println!();
                continue;
            }
            _ => {}
        }

        // Ctrl+C during a turn cancels the turn, not the program.
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        eprint!("  ...");
        let result = controller
            .run_turn_with_cancel(&mut session, line, &cancel)
            .await;
        watcher.abort();
        eprint!("\r     \r");

        println!();
        if result.is_success() {
            for line in result.text.lines() {
                println!("  Persanna > {line}");
            }
        } else {
            eprintln!("  [Error] {}", result.text);
        }
        println!();
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

/// Save after every successful turn, unless the run has no history file.
fn attach_persistence(
    controller: TurnController,
    history_path: Option<PathBuf>,
    session: &SessionState,
) -> TurnController {
    match history_path {
        Some(path) => controller.on_complete(persist_hook(path, session)),
        None => controller,
    }
}

/// Save the log and the session's usage after every successful turn.
fn persist_hook(
    path: PathBuf,
    session: &SessionState,
) -> impl Fn(&[StoredMessage]) + Send + Sync + 'static {
    let model = session.model.clone();
    let usage = session.usage.clone();
    move |log| {
        let mut snapshot = SessionState::new(model.clone());
        snapshot.messages = log.to_vec();
        snapshot.usage = usage.clone();
        if let Err(e) = store::save_session(&path, &snapshot) {
            warn!("Failed to save history to {}: {e}", path.display());
        }
    }
}
