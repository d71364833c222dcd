//! Statistics calculation engine.
//!
//! Pure functions from match/player records to derived metrics:
//! - Running win rate series
//! - Play-weighted K/D with agent and map pivots
//! - Team and global percentile ranks
//! - Map win/loss summaries
//! - Roster-to-team matching
//! - General player tables and team overviews
//!
//! Nothing here holds state between calls; identical inputs give identical
//! outputs.

pub mod kd;
pub mod maps;
pub mod players;
pub mod rank;
pub mod roster_match;
pub mod team;
pub mod win_rate;

pub use kd::weighted_kd;
pub use maps::summarize_maps;
pub use players::{general_stats, kills_by_agent, shooting_breakdown};
pub use rank::{compute_ranks, mean_kd, percentile_rank};
pub use roster_match::{assign_teams, match_rosters, BlueLabelSource, RosterMatchConfig};
pub use team::{team_labels, team_overview, weekly_breakdown};
pub use win_rate::{running_win_rate, win_rate_series};

use thiserror::Error;

/// Errors raised by the computation layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("No rows to aggregate: {0}")]
    EmptyInput(String),

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    #[error("Unresolved key: {0}")]
    UnresolvedKey(String),

    #[error("Malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `numerator / denominator`, signalling a zero denominator.
pub fn ratio(numerator: f64, denominator: f64, what: &str) -> Result<f64, StatsError> {
    if denominator == 0.0 {
        return Err(StatsError::DivisionByZero(what.to_string()));
    }
    Ok(numerator / denominator)
}

/// Win rate as a percentage of decided matches.
pub fn calculate_win_rate(wins: u32, losses: u32) -> Result<f64, StatsError> {
    ratio(wins as f64 * 100.0, (wins + losses) as f64, "no decided matches")
}
