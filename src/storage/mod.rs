//! Persistence layer.
//!
//! The league context (`context.json`) is the only persisted document. It is
//! read at cycle start and rewritten wholesale at cycle end; unknown keys
//! survive the round trip.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::LeagueContext;

/// Default context file path.
pub const DEFAULT_CONTEXT_FILE: &str = "context.json";

/// Save the league context as pretty JSON.
///
/// Writes to a sibling temp file first and renames it over the target, so a
/// crash mid-write leaves the previous document intact.
pub fn save_context(context: &LeagueContext, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(context).context("Failed to serialise league context")?;

    let tmp = temp_sibling(path);
    std::fs::write(&tmp, &json)
        .with_context(|| format!("Failed to write context to {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("Failed to replace context file {path}"))?;

    debug!(
        path,
        weekly_used = context.tracking.weekly_transactions_used,
        "Context saved"
    );
    Ok(())
}

/// Load the league context.
/// Returns None if the file doesn't exist.
pub fn load_context(path: &str) -> Result<Option<LeagueContext>> {
    if !Path::new(path).exists() {
        info!(path, "No league context found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read context from {path}"))?;
    let context: LeagueContext =
        serde_json::from_str(&json).with_context(|| format!("Failed to parse context from {path}"))?;

    info!(
        path,
        league_id = context.league.league_id,
        team_id = context.league.team_id,
        weekly_used = context.tracking.weekly_transactions_used,
        "Context loaded from disk"
    );

    Ok(Some(context))
}

/// Delete the context file (for testing or reset).
pub fn delete_context(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        std::fs::remove_file(path).with_context(|| format!("Failed to delete context file {path}"))?;
    }
    Ok(())
}

fn temp_sibling(path: &str) -> PathBuf {
    let mut tmp = PathBuf::from(path);
    let name = tmp
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_CONTEXT_FILE.to_string());
    tmp.set_file_name(format!(".{name}.tmp"));
    tmp
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
