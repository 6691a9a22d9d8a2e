//! Transaction executor.
//!
//! Turns an approved decision into at most one platform write. Identifiers
//! are checked before anything is sent, and the weekly counter moves only
//! when the write boundary reports success.

use std::sync::Arc;
use tracing::{info, warn};

use crate::platforms::transaction::TransactionRequest;
use crate::platforms::{Credentials, LeagueRef, TransactionReceipt, TransactionWriter};
use crate::strategy::candidates::LineupFix;
use crate::strategy::streaming::{SkipReason, StreamingOutcome};
use crate::types::{FantasyError, Player, TrackingState};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What happened to the streaming decision.
#[derive(Debug, Clone)]
pub enum StreamingResult {
    Skipped(SkipReason),
    Previewed {
        drop: Player,
        add: Player,
    },
    Executed {
        drop: Player,
        add: Player,
        receipt: TransactionReceipt,
    },
    Failed {
        drop: Player,
        add: Player,
        error: FantasyError,
    },
}

impl StreamingResult {
    pub fn is_executed(&self) -> bool {
        matches!(self, StreamingResult::Executed { .. })
    }

    /// Line recorded in `moves_made_today`.
    pub fn action_line(&self) -> String {
        match self {
            StreamingResult::Skipped(reason) => reason.to_string(),
            StreamingResult::Previewed { drop, add } => {
                format!("WOULD DROP {} FOR {}", drop.name, add.name)
            }
            StreamingResult::Executed { drop, add, .. } => format!(
                "Executed stream: dropped {} ({:.2}) for {} ({:.2}).",
                drop.name,
                drop.avg(),
                add.name,
                add.avg()
            ),
            StreamingResult::Failed { error, .. } => format!("Streaming failed: {error}"),
        }
    }
}

/// What happened to a lineup fix.
#[derive(Debug, Clone)]
pub enum LineupResult {
    NothingToFix,
    Blocked(LineupFix),
    Executed {
        fix: LineupFix,
        receipt: TransactionReceipt,
    },
    Failed {
        fix: LineupFix,
        error: FantasyError,
    },
}

impl LineupResult {
    pub fn is_executed(&self) -> bool {
        matches!(self, LineupResult::Executed { .. })
    }

    pub fn action_line(&self) -> String {
        match self {
            LineupResult::NothingToFix => "No injured starters need a lineup fix.".to_string(),
            LineupResult::Blocked(fix) => format!(
                "Lineup swap blocked: unable to resolve ESPN player IDs ({} / {}).",
                fix.starter.name, fix.replacement.name
            ),
            LineupResult::Executed { fix, .. } => format!("Executed lineup swap: {fix}."),
            LineupResult::Failed { fix, error } => {
                format!("Lineup swap failed ({} → {}): {error}", fix.starter.name, fix.replacement.name)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Where a write goes and on whose behalf.
pub struct WriteTarget<'a> {
    pub league: &'a LeagueRef,
    pub credentials: &'a Credentials,
    pub scoring_period_id: u32,
}

pub struct Executor {
    writer: Arc<dyn TransactionWriter>,
}

impl Executor {
    pub fn new(writer: Arc<dyn TransactionWriter>) -> Self {
        Self { writer }
    }

    /// Preview a decision without touching the platform.
    pub fn preview(outcome: &StreamingOutcome) -> StreamingResult {
        match outcome {
            StreamingOutcome::Skip(reason) => StreamingResult::Skipped(reason.clone()),
            StreamingOutcome::Execute { drop, add, .. } => {
                info!(drop = %drop.name, add = %add.name, "[DRY RUN] Would stream");
                StreamingResult::Previewed {
                    drop: drop.clone(),
                    add: add.clone(),
                }
            }
        }
    }

    /// Perform the add/drop for an Execute decision.
    pub async fn execute_streaming(
        &self,
        outcome: &StreamingOutcome,
        target: &WriteTarget<'_>,
        tracking: &mut TrackingState,
    ) -> StreamingResult {
        let (drop, add) = match outcome {
            StreamingOutcome::Skip(reason) => return StreamingResult::Skipped(reason.clone()),
            StreamingOutcome::Execute { drop, add, .. } => (drop, add),
        };

        let (Some(drop_id), Some(add_id)) = (drop.resolved_id(), add.resolved_id()) else {
            warn!(
                drop = %drop.name,
                drop_id = ?drop.player_id,
                add = %add.name,
                add_id = ?add.player_id,
                "Streaming blocked: unresolved player ids"
            );
            return StreamingResult::Skipped(SkipReason::UnresolvedIds {
                drop: drop.name.clone(),
                add: add.name.clone(),
            });
        };

        let request = TransactionRequest::add_drop(
            target.league,
            target.scoring_period_id,
            target.credentials.swid(),
            drop_id,
            add_id,
        );

        match self.writer.submit(&request, target.credentials).await {
            Ok(receipt) => {
                tracking.record_transaction();
                info!(
                    drop = %drop.name,
                    add = %add.name,
                    weekly_used = tracking.weekly_transactions_used,
                    "Streaming transaction executed"
                );
                StreamingResult::Executed {
                    drop: drop.clone(),
                    add: add.clone(),
                    receipt,
                }
            }
            Err(error) => {
                warn!(drop = %drop.name, add = %add.name, error = %error, "Streaming transaction failed");
                StreamingResult::Failed {
                    drop: drop.clone(),
                    add: add.clone(),
                    error,
                }
            }
        }
    }

    /// Perform one lineup swap. Lineup moves do not count against the weekly budget.
    pub async fn execute_lineup_fix(&self, fix: Option<&LineupFix>, target: &WriteTarget<'_>) -> LineupResult {
        let Some(fix) = fix else {
            return LineupResult::NothingToFix;
        };
        let (Some(starter_id), Some(replacement_id)) =
            (fix.starter.resolved_id(), fix.replacement.resolved_id())
        else {
            warn!(starter = %fix.starter.name, replacement = %fix.replacement.name, "Lineup swap blocked: unresolved player ids");
            return LineupResult::Blocked(fix.clone());
        };

        let request = TransactionRequest::lineup_swap(
            target.league,
            target.scoring_period_id,
            target.credentials.swid(),
            (starter_id, fix.starter_slot_id),
            (replacement_id, fix.bench_slot_id),
        );

        match self.writer.submit(&request, target.credentials).await {
            Ok(receipt) => {
                info!(starter = %fix.starter.name, replacement = %fix.replacement.name, "Lineup swap executed");
                LineupResult::Executed {
                    fix: fix.clone(),
                    receipt,
                }
            }
            Err(error) => {
                warn!(error = %error, "Lineup swap failed");
                LineupResult::Failed {
                    fix: fix.clone(),
                    error,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
