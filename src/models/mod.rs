//! Core data models: matches, player performances, rosters and derived stats.

mod fields;
mod ids;
mod match_record;
mod player_match;
mod roster;
mod stats;

pub use fields::parse_timestamp;
pub use ids::*;
pub use match_record::*;
pub use player_match::*;
pub use roster::*;
pub use stats::*;
