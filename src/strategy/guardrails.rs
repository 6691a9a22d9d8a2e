//! Drop protection.
//!
//! Decides whether a rostered player may be released. Untouchables are never
//! droppable; highly ranked players are protected unless the override for
//! season-ending injuries applies.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Player;

/// Substrings in an injury status or note that mark a season-ending injury.
/// Matching is case-insensitive. Plain "OUT" does not qualify.
pub const SEASON_ENDING_FLAGS: &[&str] = &["OUT FOR SEASON", "SEASON-ENDING", "IR"];

const DEFAULT_RANK_THRESHOLD: u32 = 50;

/// Drop-protection settings, stored under `strategy.protection_guardrails`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailConfig {
    /// Player names that are never dropped (case-insensitive).
    #[serde(default)]
    pub untouchables: Vec<String>,
    /// Players ranked strictly better (lower) than this are protected.
    #[serde(
        rename = "drop_block_orank_better_than",
        default = "default_rank_threshold"
    )]
    pub rank_threshold: u32,
    #[serde(default = "default_true")]
    pub allow_drop_if_season_ending_injury: bool,
}

fn default_rank_threshold() -> u32 {
    DEFAULT_RANK_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            untouchables: Vec::new(),
            rank_threshold: DEFAULT_RANK_THRESHOLD,
            allow_drop_if_season_ending_injury: true,
        }
    }
}

impl GuardrailConfig {
    pub fn is_untouchable(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.untouchables.iter().any(|u| u.to_lowercase() == name)
    }
}

/// Whether the injury status or note carries a season-ending flag.
pub fn is_season_ending(player: &Player) -> bool {
    let status = player.injury_status.as_deref().unwrap_or_default().to_uppercase();
    let note = player.injury_note.as_deref().unwrap_or_default().to_uppercase();
    SEASON_ENDING_FLAGS
        .iter()
        .any(|flag| status.contains(flag) || note.contains(flag))
}

/// Whether `player` may be dropped under `guardrails`.
pub fn is_droppable(player: &Player, guardrails: &GuardrailConfig) -> bool {
    if guardrails.is_untouchable(&player.name) {
        debug!(player = %player.name, "Untouchable, not droppable");
        return false;
    }

    match player.effective_rank() {
        Some(rank) if rank < guardrails.rank_threshold => {
            let allowed = guardrails.allow_drop_if_season_ending_injury && is_season_ending(player);
            debug!(
                player = %player.name,
                rank,
                threshold = guardrails.rank_threshold,
                allowed,
                "Rank-protected player"
            );
            allowed
        }
        _ => true,
    }
}
