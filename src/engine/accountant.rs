//! Weekly budget and run tracking.
//!
//! Opens the counting week at cycle start, reconciles the weekly counter with
//! what the platform reports, and stamps the tracking record at cycle end.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::engine::machine::CycleState;
use crate::strategy::streaming::{StreamingConfig, WeeklyBudget};
use crate::types::{RosterSnapshot, TrackingState};

/// Recorded when a cycle produced no action lines.
pub const NO_ACTIONS: &str = "No actionable items today.";

/// Standing plan written after every run.
pub const GAME_PLAN: &str = "Attack tomorrow with lineup re-optimization before tip-off, then stream \
     one Tier-3 spot only if best FA avg_points clears min_points_gain and weekly adds remain.";

pub struct Accountant;

impl Accountant {
    /// Reset the weekly counter when `now` starts a new ISO week.
    pub fn open_week(tracking: &mut TrackingState, now: DateTime<Utc>) -> bool {
        let previous = tracking.weekly_transactions_used;
        let reset = tracking.rollover(now);
        if reset {
            info!(
                week = tracking.week_key.as_deref().unwrap_or_default(),
                previous,
                "New transaction week, counter reset"
            );
        }
        reset
    }

    /// Weekly budget: used = max(tracked, platform-reported); limit from
    /// strategy, then platform, then the default.
    pub fn budget(
        tracking: &mut TrackingState,
        roster: &RosterSnapshot,
        config: &StreamingConfig,
    ) -> WeeklyBudget {
        WeeklyBudget {
            used: tracking.sync_used(roster.transactions_used),
            limit: config.weekly_limit(roster.acquisition_limit),
        }
    }

    /// Stamp the run. An empty action list is recorded as [`NO_ACTIONS`].
    pub fn record_run(
        tracking: &mut TrackingState,
        actions: &[String],
        mode: &str,
        state: CycleState,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let actions = if actions.is_empty() {
            vec![NO_ACTIONS.to_string()]
        } else {
            actions.to_vec()
        };

        tracking.last_run_utc = Some(now);
        tracking.moves_made_today = actions.clone();
        tracking.plan_for_tomorrow = Some(GAME_PLAN.to_string());
        tracking.last_mode = Some(mode.to_string());
        tracking.last_state = Some(state.to_string());

        info!(
            mode,
            state = %state,
            actions = actions.len(),
            weekly_used = tracking.weekly_transactions_used,
            "Run recorded"
        );
        actions
    }
}
