//! # Match Stats
//!
//! A statistics engine for a tracked team's competitive matches.
//!
//! ## Architecture
//!
//! - **table**: In-memory tabular records (group-by, join, pivot, sort)
//! - **models**: Core data structures (matches, player performances, rosters)
//! - **calculate**: Statistics and derived metrics computation
//! - **storage**: Local CSV / JSONL sheet exports
//! - **fetch**: Spreadsheet CSV exports over HTTP with a TTL cache
//! - **ingest**: Typed, filtered datasets built from raw sheet rows
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod storage;
pub mod table;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "30m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num.checked_mul(multiplier)?))
}
