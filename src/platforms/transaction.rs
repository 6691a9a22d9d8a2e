//! Transaction request bodies.
//!
//! The ESPN write endpoint is not documented. Bodies are either the built-in
//! shapes below (captured from the browser) or a user-captured template with
//! `{placeholder}` tokens substituted at runtime. The template always wins.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use tracing::debug;

use super::LeagueRef;
use crate::types::FantasyError;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    AddDrop,
    LineupSwap,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::AddDrop => write!(f, "add/drop"),
            TransactionKind::LineupSwap => write!(f, "lineup swap"),
        }
    }
}

/// The players (and, for lineup swaps, slots) a transaction moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionItems {
    AddDrop {
        drop_player_id: i64,
        add_player_id: i64,
    },
    LineupSwap {
        starter_player_id: i64,
        replacement_player_id: i64,
        starter_slot_id: u16,
        bench_slot_id: u16,
    },
}

/// One write, built fresh for each attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub league_id: i64,
    pub team_id: i64,
    pub season_year: i32,
    pub scoring_period_id: u32,
    /// Owning member (the SWID) for lineup bodies.
    pub member_id: String,
    pub items: TransactionItems,
}

impl TransactionRequest {
    pub fn add_drop(
        league: &LeagueRef,
        scoring_period_id: u32,
        member_id: &str,
        drop_player_id: i64,
        add_player_id: i64,
    ) -> Self {
        Self {
            league_id: league.league_id,
            team_id: league.team_id,
            season_year: league.season_year,
            scoring_period_id,
            member_id: member_id.to_string(),
            items: TransactionItems::AddDrop {
                drop_player_id,
                add_player_id,
            },
        }
    }

    pub fn lineup_swap(
        league: &LeagueRef,
        scoring_period_id: u32,
        member_id: &str,
        starter: (i64, u16),
        replacement: (i64, u16),
    ) -> Self {
        Self {
            league_id: league.league_id,
            team_id: league.team_id,
            season_year: league.season_year,
            scoring_period_id,
            member_id: member_id.to_string(),
            items: TransactionItems::LineupSwap {
                starter_player_id: starter.0,
                replacement_player_id: replacement.0,
                starter_slot_id: starter.1,
                bench_slot_id: replacement.1,
            },
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self.items {
            TransactionItems::AddDrop { .. } => TransactionKind::AddDrop,
            TransactionItems::LineupSwap { .. } => TransactionKind::LineupSwap,
        }
    }

    /// Placeholder → value pairs for template substitution.
    pub fn placeholders(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("{league_id}", self.league_id.to_string()),
            ("{team_id}", self.team_id.to_string()),
            ("{year}", self.season_year.to_string()),
            ("{scoring_period_id}", self.scoring_period_id.to_string()),
            ("{member_id}", self.member_id.clone()),
        ];
        match &self.items {
            TransactionItems::AddDrop {
                drop_player_id,
                add_player_id,
            } => {
                pairs.push(("{drop_player_id}", drop_player_id.to_string()));
                pairs.push(("{add_player_id}", add_player_id.to_string()));
            }
            TransactionItems::LineupSwap {
                starter_player_id,
                replacement_player_id,
                starter_slot_id,
                bench_slot_id,
            } => {
                pairs.push(("{starter_player_id}", starter_player_id.to_string()));
                pairs.push(("{replacement_player_id}", replacement_player_id.to_string()));
                pairs.push(("{starter_slot_id}", starter_slot_id.to_string()));
                pairs.push(("{bench_slot_id}", bench_slot_id.to_string()));
            }
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Body builder
// ---------------------------------------------------------------------------

/// Produces the JSON body for a request, from a template when one is configured.
#[derive(Debug, Clone, Default)]
pub struct TransactionRequestBuilder {
    template: Option<String>,
}

impl TransactionRequestBuilder {
    pub fn with_template(template: impl Into<String>) -> Self {
        let template = template.into();
        Self {
            template: (!template.trim().is_empty()).then_some(template),
        }
    }

    /// Template from `body_file` if that file exists, else from the inline body.
    /// A missing file falls through silently; an unreadable one is an error.
    pub fn from_sources(body_file: Option<&str>, inline: Option<&str>) -> Result<Self, FantasyError> {
        if let Some(file) = body_file.map(str::trim).filter(|f| !f.is_empty()) {
            let path = Path::new(file);
            if path.exists() {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    FantasyError::Template(format!("cannot read body file {file}: {e}"))
                })?;
                debug!(file, "Using transaction body template from file");
                return Ok(Self::with_template(raw));
            }
        }
        Ok(inline
            .map(Self::with_template)
            .unwrap_or_default())
    }

    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }

    /// Build the JSON body for `request`.
    pub fn build(&self, request: &TransactionRequest) -> Result<Value, FantasyError> {
        match &self.template {
            Some(template) => {
                let raw = substitute_placeholders(template, &request.placeholders());
                serde_json::from_str(&raw).map_err(|e| {
                    FantasyError::Template(format!(
                        "{} body is not valid JSON after substitution: {e}",
                        request.kind()
                    ))
                })
            }
            None => Ok(default_body(request)),
        }
    }
}

/// Replace every occurrence of every placeholder. Unknown tokens are left as-is.
pub fn substitute_placeholders(template: &str, pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .fold(template.to_string(), |acc, (token, value)| acc.replace(token, value))
}

fn default_body(request: &TransactionRequest) -> Value {
    match &request.items {
        // memberId carries the team id here; ESPN has accepted this shape.
        TransactionItems::AddDrop {
            drop_player_id,
            add_player_id,
        } => json!({
            "type": "ROSTER",
            "memberId": request.team_id.to_string(),
            "executionType": "EXECUTE",
            "items": [
                {"playerId": add_player_id, "type": "ADD", "fromSlotId": 0},
                {"playerId": drop_player_id, "type": "DROP", "fromSlotId": 0},
            ],
        }),
        TransactionItems::LineupSwap {
            starter_player_id,
            replacement_player_id,
            starter_slot_id,
            bench_slot_id,
        } => json!({
            "isLeagueManager": false,
            "teamId": request.team_id,
            "type": "ROSTER",
            "scoringPeriodId": request.scoring_period_id,
            "executionType": "EXECUTE",
            "memberId": request.member_id,
            "items": [
                {
                    "playerId": replacement_player_id,
                    "type": "LINEUP",
                    "fromLineupSlotId": bench_slot_id,
                    "toLineupSlotId": starter_slot_id,
                    "fromTeamId": 0,
                    "toTeamId": 0,
                },
                {
                    "playerId": starter_player_id,
                    "type": "LINEUP",
                    "fromLineupSlotId": starter_slot_id,
                    "toLineupSlotId": bench_slot_id,
                    "fromTeamId": 0,
                    "toTeamId": 0,
                },
            ],
        }),
    }
}
