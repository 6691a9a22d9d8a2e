//! Shared types for the WAIVERWIRE engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that platform, strategy,
//! and engine modules can depend on them without circular references.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::platforms::slots;
use crate::strategy::guardrails::GuardrailConfig;
use crate::strategy::streaming::StreamingConfig;
use crate::strategy::valuation::points_value;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Read-only view of a player as reported by the league platform.
///
/// Rank data is modelled as three optional fields with a fixed precedence
/// (`rank`, then `projected_rank`, then `draft_rank`); see [`Player::effective_rank`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Platform player ID. `None` (or a non-positive value) means unresolved.
    #[serde(default)]
    pub player_id: Option<i64>,
    pub name: String,
    /// Lineup slot name as shown on the platform ("PG", "BE", "IR", ...).
    #[serde(default)]
    pub slot: String,
    /// Default playing position, when known.
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub injury_status: Option<String>,
    #[serde(default)]
    pub injury_note: Option<String>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub projected_rank: Option<u32>,
    #[serde(default)]
    pub draft_rank: Option<u32>,
    /// Trailing (season) fantasy points per game.
    #[serde(default)]
    pub avg_points: Option<f64>,
    /// Projected fantasy points per game.
    #[serde(default)]
    pub projected_avg_points: Option<f64>,
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] avg={:.2} proj={:.2}",
            self.name,
            self.slot,
            self.avg(),
            self.projected_avg(),
        )
    }
}

impl Player {
    pub fn new(name: &str, slot: &str) -> Self {
        Self {
            name: name.to_string(),
            slot: slot.to_string(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, player_id: i64) -> Self {
        self.player_id = Some(player_id);
        self
    }

    pub fn with_averages(mut self, avg_points: f64, projected_avg_points: f64) -> Self {
        self.avg_points = Some(avg_points);
        self.projected_avg_points = Some(projected_avg_points);
        self
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.injury_status = Some(status.to_string());
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.injury_note = Some(note.to_string());
        self
    }

    /// First present rank in precedence order: rank, projected, draft.
    pub fn effective_rank(&self) -> Option<u32> {
        self.rank.or(self.projected_rank).or(self.draft_rank)
    }

    /// Trailing average, with missing or non-finite values read as 0.0.
    pub fn avg(&self) -> f64 {
        finite_or_zero(self.avg_points)
    }

    /// Projected average, with missing or non-finite values read as 0.0.
    pub fn projected_avg(&self) -> f64 {
        finite_or_zero(self.projected_avg_points)
    }

    /// Blended value used for every ranking comparison.
    pub fn value(&self) -> f64 {
        points_value(self)
    }

    /// Platform ID usable in a transaction body.
    pub fn resolved_id(&self) -> Option<i64> {
        self.player_id.filter(|id| *id > 0)
    }

    /// Injury status, upper-cased; empty when absent.
    pub fn status_upper(&self) -> String {
        self.injury_status
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_uppercase()
    }

    pub fn is_bench(&self) -> bool {
        slots::is_bench(&self.slot)
    }

    pub fn is_injured_reserve(&self) -> bool {
        slots::is_injured_reserve(&self.slot)
    }

    /// Starters are every slot that is neither bench nor IR.
    pub fn is_starter(&self) -> bool {
        !self.is_bench() && !self.is_injured_reserve()
    }

    /// Status is ACTIVE, HEALTHY or blank.
    pub fn is_healthy(&self) -> bool {
        matches!(self.status_upper().as_str(), "ACTIVE" | "HEALTHY" | "")
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Roster snapshot
// ---------------------------------------------------------------------------

/// Players owned by the managed team, fetched fresh each cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub team_id: i64,
    pub team_name: String,
    pub scoring_period_id: u32,
    pub players: Vec<Player>,
    /// Acquisitions used this matchup period, when the platform reports it.
    #[serde(default)]
    pub transactions_used: Option<u32>,
    /// League acquisition limit, when the platform reports one.
    #[serde(default)]
    pub acquisition_limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

/// A suggested roster action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Proposal {
    IrActivation { player: Player },
    IrPlacement { player: Player },
    LineupSwap { bench: Player, starter: Player, gain: f64 },
    StreamingSwap { drop: Player, add: Player, gain: f64 },
}

impl fmt::Display for Proposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proposal::IrActivation { player } => write!(
                f,
                "Review IR activation: {} appears eligible to return.",
                player.name
            ),
            Proposal::IrPlacement { player } => write!(
                f,
                "Move {} to IR: listed OUT while in {} slot.",
                player.name, player.slot
            ),
            Proposal::LineupSwap {
                bench,
                starter,
                gain,
            } => write!(f, "Start {} over {} (+{gain:.2})", bench.name, starter.name),
            Proposal::StreamingSwap { drop, add, gain } => write!(
                f,
                "Drop {} ({:.2}) for {} ({:.2}), +{gain:.2}",
                drop.name,
                drop.avg(),
                add.name,
                add.avg(),
            ),
        }
    }
}

impl Proposal {
    pub fn is_ir(&self) -> bool {
        matches!(
            self,
            Proposal::IrActivation { .. } | Proposal::IrPlacement { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Persisted league context
// ---------------------------------------------------------------------------

/// The JSON document read at cycle start and rewritten wholesale at cycle end.
///
/// Unknown top-level keys are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueContext {
    pub league: LeagueSection,
    #[serde(default)]
    pub strategy: StrategySection,
    #[serde(default)]
    pub season: SeasonSection,
    #[serde(default)]
    pub tracking: TrackingState,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueSection {
    pub league_id: i64,
    pub team_id: i64,
    pub season_year: i32,
    #[serde(default)]
    pub espn_auth: EspnAuth,
}

/// Raw session cookie values as stored in the context file.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct EspnAuth {
    #[serde(default)]
    pub swid: String,
    #[serde(default)]
    pub espn_s2: String,
}

impl fmt::Debug for EspnAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EspnAuth")
            .field("swid", &self.swid)
            .field("espn_s2", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategySection {
    #[serde(default)]
    pub protection_guardrails: GuardrailConfig,
    #[serde(default)]
    pub tiered_streaming: StreamingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonSection {
    #[serde(default)]
    pub current_record: Option<String>,
}

// ---------------------------------------------------------------------------
// Tracking state
// ---------------------------------------------------------------------------

/// Run tracking, persisted inside the league context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingState {
    #[serde(default)]
    pub weekly_transactions_used: u32,
    /// ISO week the counter belongs to, e.g. "2026-W43".
    #[serde(default)]
    pub week_key: Option<String>,
    #[serde(default)]
    pub last_run_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub moves_made_today: Vec<String>,
    #[serde(default)]
    pub plan_for_tomorrow: Option<String>,
    #[serde(default)]
    pub last_mode: Option<String>,
    #[serde(default)]
    pub last_state: Option<String>,
}

impl TrackingState {
    /// ISO week key for a timestamp.
    pub fn week_key_for(now: DateTime<Utc>) -> String {
        let week = now.iso_week();
        format!("{}-W{:02}", week.year(), week.week())
    }

    /// Start a new counting week if `now` falls outside the tracked one.
    /// Returns true when the counter was reset.
    pub fn rollover(&mut self, now: DateTime<Utc>) -> bool {
        let key = Self::week_key_for(now);
        match self.week_key.as_deref() {
            Some(current) if current == key => false,
            Some(_) => {
                self.week_key = Some(key);
                self.weekly_transactions_used = 0;
                true
            }
            None => {
                // First run with tracking: adopt the week, keep the counter.
                self.week_key = Some(key);
                false
            }
        }
    }

    /// Raise the counter to a platform-reported value; never lowers it.
    pub fn sync_used(&mut self, reported: Option<u32>) -> u32 {
        if let Some(reported) = reported {
            self.weekly_transactions_used = self.weekly_transactions_used.max(reported);
        }
        self.weekly_transactions_used
    }

    /// Count one successful transactional write.
    pub fn record_transaction(&mut self) {
        self.weekly_transactions_used = self.weekly_transactions_used.saturating_add(1);
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for WAIVERWIRE.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FantasyError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("ESPN request failed: HTTP {status} - {body}")]
    HttpStatus { status: u16, body: String },

    #[error("ESPN transaction error: {0}")]
    PlatformRejection(String),

    #[error("Unresolved player identifier: {0}")]
    UnresolvedIdentifier(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// A bug in the engine itself, never caused by user input.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for FantasyError {
    fn from(e: reqwest::Error) -> Self {
        FantasyError::Transport(e.to_string())
    }
}

impl FantasyError {
    /// Errors that abort a cycle before any platform I/O.
    pub fn is_fatal_setup(&self) -> bool {
        matches!(
            self,
            FantasyError::Configuration(_) | FantasyError::Lookup(_) | FantasyError::Storage(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
