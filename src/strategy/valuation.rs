//! Player valuation.
//!
//! A single blended points value is the ranking key for every comparison
//! in candidate selection: 70% trailing average, 30% projection.

use crate::types::Player;

/// Weight applied to the trailing (season) average.
pub const TRAILING_WEIGHT: f64 = 0.7;
/// Weight applied to the projected average.
pub const PROJECTED_WEIGHT: f64 = 0.3;

/// Blended points value. Missing or non-finite fields count as 0.0.
pub fn points_value(player: &Player) -> f64 {
    player.avg() * TRAILING_WEIGHT + player.projected_avg() * PROJECTED_WEIGHT
}
