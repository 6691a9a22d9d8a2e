//! Confirmation state machine.
//!
//! ```text
//! Idle → ProposalsGenerated ─┬─ NothingToExecute / Preview ─→ Skipped
//!                            ├─ Confirm (programmatic) ─────→ Executing
//!                            ├─ Decline (programmatic) ─────→ Declined
//!                            └─ RequestConfirmation ─→ AwaitingConfirmation
//! AwaitingConfirmation ─┬─ Confirm ────→ Executing
//!                       ├─ Decline ────→ Declined
//!                       └─ Regenerate ─→ ProposalsGenerated (Declined at the cap)
//! Executing ─┬─ Completed ──→ Executed | Failed
//!             └─ Blocked ────→ Skipped (write refused before sending)
//! ```
//!
//! Terminal states accept no events. At most one Executing phase per cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    ProposalsGenerated,
    AwaitingConfirmation,
    Executing,
    Skipped,
    Executed,
    Failed,
    Declined,
}

impl CycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CycleState::Skipped | CycleState::Executed | CycleState::Failed | CycleState::Declined
        )
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CycleState::Idle => "idle",
            CycleState::ProposalsGenerated => "proposals_generated",
            CycleState::AwaitingConfirmation => "awaiting_confirmation",
            CycleState::Executing => "executing",
            CycleState::Skipped => "skipped",
            CycleState::Executed => "executed",
            CycleState::Failed => "failed",
            CycleState::Declined => "declined",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEvent {
    Generated,
    NothingToExecute,
    Preview,
    RequestConfirmation,
    Confirm,
    Decline,
    Regenerate,
    Completed { success: bool },
    /// The write was refused locally and nothing was sent.
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition: {event:?} in state {state}")]
pub struct InvalidTransition {
    pub state: CycleState,
    pub event: CycleEvent,
}

/// Bounded confirmation machine for one cycle.
#[derive(Debug, Clone)]
pub struct CycleMachine {
    state: CycleState,
    regenerations: u32,
    max_regenerations: u32,
}

impl CycleMachine {
    pub fn new(max_regenerations: u32) -> Self {
        Self {
            state: CycleState::Idle,
            regenerations: 0,
            max_regenerations,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn regenerations(&self) -> u32 {
        self.regenerations
    }

    /// Apply an event, returning the new state.
    pub fn apply(&mut self, event: CycleEvent) -> Result<CycleState, InvalidTransition> {
        use CycleEvent as E;
        use CycleState as S;

        let next = match (self.state, event) {
            (S::Idle, E::Generated) => S::ProposalsGenerated,
            (S::ProposalsGenerated, E::NothingToExecute | E::Preview) => S::Skipped,
            (S::ProposalsGenerated, E::RequestConfirmation) => S::AwaitingConfirmation,
            (S::ProposalsGenerated | S::AwaitingConfirmation, E::Confirm) => S::Executing,
            (S::ProposalsGenerated | S::AwaitingConfirmation, E::Decline) => S::Declined,
            (S::AwaitingConfirmation, E::Regenerate) => {
                if self.regenerations >= self.max_regenerations {
                    S::Declined
                } else {
                    self.regenerations += 1;
                    S::ProposalsGenerated
                }
            }
            (S::Executing, E::Completed { success: true }) => S::Executed,
            (S::Executing, E::Completed { success: false }) => S::Failed,
            (S::Executing, E::Blocked) => S::Skipped,
            (state, event) => return Err(InvalidTransition { state, event }),
        };
        self.state = next;
        Ok(next)
    }
}
