//! Saving and loading session snapshots as JSON

use anyhow::{Context, Result};
use bioresolve_orchestrator::SessionSnapshot;
use std::path::Path;
use tracing::debug;

pub fn save_session(path: &Path, snapshot: &SessionSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json =
        serde_json::to_string_pretty(snapshot).context("Failed to serialize session snapshot")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write session {}", path.display()))?;
    debug!("Saved session to {}", path.display());
    Ok(())
}

pub fn load_session(path: &Path) -> Result<SessionSnapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Invalid session file {}", path.display()))
}
