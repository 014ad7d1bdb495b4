//! Pure scoring and ranking computations.
//!
//! Nothing in here touches the database, the cache or the clock. Callers hand
//! in plain records and get back scores, ranks and winners.

pub mod boulder;
pub mod bracket;
pub mod error;
pub mod finals;
pub mod qualification;

pub use error::{BracketError, ScoringError};

pub type ClimberId = i64;

/// Rounds to a fixed number of decimal places.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
