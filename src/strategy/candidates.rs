//! Candidate selection.
//!
//! Pure classification over a roster snapshot: IR moves, lineup swaps,
//! injured-starter fixes and the lowest-value droppable ("Tier 3") players.
//! Every sort here is stable, so equal values keep roster order.

use serde::Serialize;

use super::guardrails::{is_droppable, GuardrailConfig};
use crate::platforms::slots;
use crate::types::{Player, Proposal};

/// Number of droppable players considered for streaming.
pub const TIER3_SIZE: usize = 3;

/// Starter statuses that call for a bench replacement.
const UNAVAILABLE_STATUSES: &[&str] = &["OUT", "DAY_TO_DAY", "DTD"];

/// IR placements (OUT outside an IR slot) and activations (healthy in an IR slot).
pub fn ir_candidates(roster: &[Player]) -> Vec<Proposal> {
    roster
        .iter()
        .filter_map(|p| {
            if p.is_injured_reserve() {
                p.is_healthy()
                    .then(|| Proposal::IrActivation { player: p.clone() })
            } else if p.status_upper() == "OUT" {
                Some(Proposal::IrPlacement { player: p.clone() })
            } else {
                None
            }
        })
        .collect()
}

/// Positional bench-over-starter swaps.
///
/// Bench is sorted by value descending and starters ascending, then the two
/// lists are zipped. Slot eligibility is not checked: these are suggestions
/// for a human to review.
pub fn lineup_swaps(roster: &[Player]) -> Vec<Proposal> {
    let mut bench: Vec<&Player> = roster.iter().filter(|p| p.is_bench()).collect();
    let mut starters: Vec<&Player> = roster.iter().filter(|p| p.is_starter()).collect();

    bench.sort_by(|a, b| b.value().total_cmp(&a.value()));
    starters.sort_by(|a, b| a.value().total_cmp(&b.value()));

    bench
        .into_iter()
        .zip(starters)
        .filter(|(b, s)| b.value() > s.value())
        .map(|(b, s)| Proposal::LineupSwap {
            gain: b.value() - s.value(),
            bench: b.clone(),
            starter: s.clone(),
        })
        .collect()
}

/// The lowest-value droppable players, at most [`TIER3_SIZE`].
pub fn tier3_candidates(roster: &[Player], guardrails: &GuardrailConfig) -> Vec<Player> {
    let mut droppable: Vec<&Player> = roster
        .iter()
        .filter(|p| is_droppable(p, guardrails))
        .collect();
    droppable.sort_by(|a, b| a.value().total_cmp(&b.value()));
    droppable.into_iter().take(TIER3_SIZE).cloned().collect()
}

/// A starter who cannot play, paired with the bench player to promote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupFix {
    pub starter: Player,
    pub replacement: Player,
    pub starter_slot_id: u16,
    pub bench_slot_id: u16,
    /// Blended value the replacement brings into the lineup.
    pub replacement_value: f64,
}

impl std::fmt::Display for LineupFix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bench {} ({}) and start {} in {} ({:.2})",
            self.starter.name,
            self.starter.status_upper(),
            self.replacement.name,
            self.starter.slot,
            self.replacement_value,
        )
    }
}

/// Unavailable starters (OUT / day-to-day) matched, in roster order, with the
/// best remaining healthy bench players.
pub fn lineup_fixes(roster: &[Player]) -> Vec<LineupFix> {
    let mut bench: Vec<&Player> = roster
        .iter()
        .filter(|p| p.is_bench() && p.is_healthy())
        .collect();
    bench.sort_by(|a, b| b.value().total_cmp(&a.value()));

    roster
        .iter()
        .filter(|p| p.is_starter() && UNAVAILABLE_STATUSES.contains(&p.status_upper().as_str()))
        .zip(bench)
        .map(|(starter, replacement)| LineupFix {
            starter_slot_id: slots::slot_id(&starter.slot),
            bench_slot_id: slots::slot_id(&replacement.slot),
            replacement_value: replacement.value(),
            starter: starter.clone(),
            replacement: replacement.clone(),
        })
        .collect()
}
