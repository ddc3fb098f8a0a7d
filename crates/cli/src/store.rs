//! Session persistence: the message log and usage counters as JSON.

use persanna_core::session::SessionState;
use std::path::Path;
use tracing::debug;

pub type StoreResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Load the saved session, or start a fresh one when none exists.
pub fn load_session(path: &Path, default_model: &str) -> StoreResult<SessionState> {
    if !path.exists() {
        debug!(path = %path.display(), "No saved session");
        return Ok(SessionState::new(default_model));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let mut session: SessionState = serde_json::from_str(&content)
        .map_err(|e| format!("Corrupt session file {}: {e}", path.display()))?;

    if session.model.is_empty() {
        session.model = default_model.to_string();
    }
    debug!(messages = session.messages.len(), "Loaded saved session");
    Ok(session)
}

/// Write the session, replacing the previous file atomically.
pub fn save_session(path: &Path, session: &SessionState) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(session)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
