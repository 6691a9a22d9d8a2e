//! Streaming decision.
//!
//! Compares the worst Tier-3 player against the best available free agent
//! and decides whether a single add/drop is worth spending a weekly
//! transaction on. Both sides are compared on trailing average only, not on
//! the blended value used for candidate selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::types::Player;

/// Weekly limit used when neither the strategy nor the platform provides one.
pub const DEFAULT_WEEKLY_LIMIT: u32 = 7;

const DEFAULT_MIN_POINTS_GAIN: f64 = 3.0;

/// Streaming settings, stored under `strategy.tiered_streaming`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingConfig {
    #[serde(default = "default_min_points_gain")]
    pub min_points_gain: f64,
    #[serde(default)]
    pub weekly_transaction_limit: Option<u32>,
    /// Default run mode for the CLI when no mode flag is given.
    #[serde(default = "default_true")]
    pub dry_run: bool,
}

fn default_min_points_gain() -> f64 {
    DEFAULT_MIN_POINTS_GAIN
}

fn default_true() -> bool {
    true
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            min_points_gain: DEFAULT_MIN_POINTS_GAIN,
            weekly_transaction_limit: None,
            dry_run: true,
        }
    }
}

impl StreamingConfig {
    /// Configured limit, else the platform's, else [`DEFAULT_WEEKLY_LIMIT`].
    pub fn weekly_limit(&self, platform_limit: Option<u32>) -> u32 {
        self.weekly_transaction_limit
            .or(platform_limit)
            .unwrap_or(DEFAULT_WEEKLY_LIMIT)
    }
}

/// Transactions used and allowed this week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyBudget {
    pub used: u32,
    pub limit: u32,
}

impl WeeklyBudget {
    pub fn exhausted(&self) -> bool {
        self.used >= self.limit
    }
}

/// Why no streaming transaction is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NoEligiblePlayers,
    NoFreeAgents,
    FreeAgentsUnavailable {
        error: String,
    },
    LimitReached {
        used: u32,
        limit: u32,
    },
    InsufficientGain {
        best: String,
        best_avg: f64,
        worst: String,
        worst_avg: f64,
        min_gain: f64,
    },
    UnresolvedIds {
        drop: String,
        add: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoEligiblePlayers => {
                write!(f, "No eligible Tier 3 players available for streaming.")
            }
            SkipReason::NoFreeAgents => write!(f, "No free agents returned by ESPN API."),
            SkipReason::FreeAgentsUnavailable { error } => {
                write!(f, "Streaming failed: could not fetch free agents ({error}).")
            }
            SkipReason::LimitReached { used, limit } => write!(
                f,
                "Streaming skipped: weekly transaction limit reached ({used}/{limit})."
            ),
            SkipReason::InsufficientGain {
                best,
                best_avg,
                worst,
                worst_avg,
                min_gain,
            } => write!(
                f,
                "Streaming skipped: best FA ({best} {best_avg:.2}) does not exceed \
                 {worst} ({worst_avg:.2}) by min gain {min_gain:.2}."
            ),
            SkipReason::UnresolvedIds { drop, add } => write!(
                f,
                "Streaming blocked: unable to resolve ESPN player IDs for add/drop \
                 execution ({drop} / {add})."
            ),
        }
    }
}

/// Result of the streaming decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum StreamingOutcome {
    Skip(SkipReason),
    Execute { drop: Player, add: Player, gain: f64 },
}

impl StreamingOutcome {
    pub fn is_execute(&self) -> bool {
        matches!(self, StreamingOutcome::Execute { .. })
    }

    /// Preview rendering; never touches the platform.
    pub fn preview(&self) -> String {
        match self {
            StreamingOutcome::Skip(reason) => reason.to_string(),
            StreamingOutcome::Execute { drop, add, .. } => {
                format!("WOULD DROP {} FOR {}", drop.name, add.name)
            }
        }
    }
}

/// First player with the lowest trailing average.
fn worst_by_avg(players: &[Player]) -> Option<&Player> {
    players.iter().fold(None, |worst: Option<&Player>, p| match worst {
        Some(w) if w.avg() <= p.avg() => Some(w),
        _ => Some(p),
    })
}

/// First player with the highest trailing average.
fn best_by_avg(players: &[Player]) -> Option<&Player> {
    players.iter().fold(None, |best: Option<&Player>, p| match best {
        Some(b) if b.avg() >= p.avg() => Some(b),
        _ => Some(p),
    })
}

/// Decide whether to stream. Pure: the caller performs any write.
pub fn decide(
    tier3: &[Player],
    free_agents: &[Player],
    config: &StreamingConfig,
    budget: WeeklyBudget,
) -> StreamingOutcome {
    let Some(worst) = worst_by_avg(tier3) else {
        return StreamingOutcome::Skip(SkipReason::NoEligiblePlayers);
    };
    let Some(best) = best_by_avg(free_agents) else {
        return StreamingOutcome::Skip(SkipReason::NoFreeAgents);
    };

    if budget.exhausted() {
        return StreamingOutcome::Skip(SkipReason::LimitReached {
            used: budget.used,
            limit: budget.limit,
        });
    }

    let (worst_avg, best_avg) = (worst.avg(), best.avg());
    if best_avg <= worst_avg + config.min_points_gain {
        return StreamingOutcome::Skip(SkipReason::InsufficientGain {
            best: best.name.clone(),
            best_avg,
            worst: worst.name.clone(),
            worst_avg,
            min_gain: config.min_points_gain,
        });
    }

    debug!(
        drop = %worst.name,
        add = %best.name,
        gain = format!("{:.2}", best_avg - worst_avg),
        "Streaming swap clears threshold"
    );

    StreamingOutcome::Execute {
        drop: worst.clone(),
        add: best.clone(),
        gain: best_avg - worst_avg,
    }
}
