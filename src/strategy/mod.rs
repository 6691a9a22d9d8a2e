//! Strategy: guardrails, valuation, candidate selection and the streaming decision.

pub mod candidates;
pub mod guardrails;
pub mod streaming;
pub mod valuation;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::types::{FantasyError, Player, Proposal, RosterSnapshot, StrategySection};
use streaming::{SkipReason, StreamingOutcome, WeeklyBudget};

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// Streaming section of a suggestion set.
#[derive(Debug, Clone, Serialize)]
pub struct StreamingSuggestion {
    pub outcome: StreamingOutcome,
    pub tier3: Vec<Player>,
    pub budget: WeeklyBudget,
}

/// All proposals for one roster snapshot. Each category is computed
/// independently; a failed free-agent read only affects streaming.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestions {
    pub generated_at: DateTime<Utc>,
    pub scoring_period_id: u32,
    pub ir: Vec<Proposal>,
    pub lineup: Vec<Proposal>,
    pub streaming: StreamingSuggestion,
}

impl Suggestions {
    /// The one transactional proposal, if the streaming decision is Execute.
    pub fn streaming_proposal(&self) -> Option<Proposal> {
        match &self.streaming.outcome {
            StreamingOutcome::Execute { drop, add, gain } => Some(Proposal::StreamingSwap {
                drop: drop.clone(),
                add: add.clone(),
                gain: *gain,
            }),
            StreamingOutcome::Skip(_) => None,
        }
    }

    /// Whether there is anything to confirm.
    pub fn is_actionable(&self) -> bool {
        self.streaming.outcome.is_execute()
    }

    /// Human-readable preview lines, IR first, then lineup, then streaming.
    pub fn preview_lines(&self) -> Vec<String> {
        self.ir
            .iter()
            .chain(self.lineup.iter())
            .map(ToString::to_string)
            .chain(std::iter::once(self.streaming.outcome.preview()))
            .collect()
    }
}

/// Build the full suggestion set for a roster.
///
/// `free_agents` is the result of the free-agent read; an error there turns
/// into a streaming skip while IR and lineup proposals are still produced.
pub fn build_suggestions(
    roster: &RosterSnapshot,
    free_agents: Result<Vec<Player>, FantasyError>,
    strategy: &StrategySection,
    budget: WeeklyBudget,
) -> Suggestions {
    let ir = candidates::ir_candidates(&roster.players);
    let lineup = candidates::lineup_swaps(&roster.players);
    let tier3 = candidates::tier3_candidates(&roster.players, &strategy.protection_guardrails);

    let outcome = match free_agents {
        Ok(fas) => streaming::decide(&tier3, &fas, &strategy.tiered_streaming, budget),
        Err(e) if tier3.is_empty() => {
            info!(error = %e, "Free agent read failed, but no Tier 3 candidates anyway");
            StreamingOutcome::Skip(SkipReason::NoEligiblePlayers)
        }
        Err(e) => StreamingOutcome::Skip(SkipReason::FreeAgentsUnavailable {
            error: e.to_string(),
        }),
    };

    info!(
        ir = ir.len(),
        lineup = lineup.len(),
        tier3 = tier3.len(),
        used = budget.used,
        limit = budget.limit,
        streaming = %outcome.preview(),
        "Suggestions generated"
    );

    Suggestions {
        generated_at: Utc::now(),
        scoring_period_id: roster.scoring_period_id,
        ir,
        lineup,
        streaming: StreamingSuggestion {
            outcome,
            tier3,
            budget,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
