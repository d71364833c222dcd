//! Derived statistics models.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchId, Outcome, PlayerId};

/// A ratio that may be undefined (zero denominator).
///
/// Serializes as a number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KdValue {
    Defined(f64),
    Undefined,
}

impl KdValue {
    pub fn value(self) -> Option<f64> {
        match self {
            KdValue::Defined(v) => Some(v),
            KdValue::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, KdValue::Defined(_))
    }
}

impl From<Option<f64>> for KdValue {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(v) if v.is_finite() => KdValue::Defined(v),
            _ => KdValue::Undefined,
        }
    }
}

/// A per-record ratio left out of an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedRatio {
    pub player: PlayerId,
    pub match_id: MatchId,
    pub reason: String,
}

/// One player's K/D line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdRow {
    pub player: PlayerId,

    /// Play-weighted average K/D
    pub weighted_kd: KdValue,

    /// Matches played (including zero-death matches)
    pub matches: u32,

    /// Mean K/D per agent; missing combinations are 0
    pub by_agent: BTreeMap<String, f64>,

    /// Mean K/D per map; missing combinations are 0
    pub by_map: BTreeMap<String, f64>,
}

/// Weighted K/D report with pivots by agent and map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdReport {
    /// Agent columns, ascending
    pub agents: Vec<String>,

    /// Map columns, ascending
    pub maps: Vec<String>,

    /// Sorted by weighted K/D desc, then player id; undefined rows last
    pub rows: Vec<KdRow>,

    /// Zero-death records excluded from the averages
    pub excluded: Vec<ExcludedRatio>,
}

impl KdReport {
    pub fn get(&self, player: &PlayerId) -> Option<&KdRow> {
        self.rows.iter().find(|r| &r.player == player)
    }
}

/// Percentile ranks for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRank {
    pub player: PlayerId,
    pub team: Option<String>,

    /// The ranked metric (mean K/D)
    pub value: f64,

    /// Rank within the player's team; `None` without a team
    pub team_rank: Option<f64>,

    /// Rank within the whole population
    pub global_rank: f64,
}

/// Ranking output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankReport {
    /// Ranked players, by player id
    pub ranks: Vec<PlayerRank>,

    /// Players left out because their metric is undefined
    pub unranked: Vec<PlayerId>,
}

impl RankReport {
    pub fn get(&self, player: &PlayerId) -> Option<&PlayerRank> {
        self.ranks.iter().find(|r| &r.player == player)
    }

    /// Keep only the listed players. Ranks already computed are unchanged.
    pub fn retain_players(&mut self, keep: &HashSet<PlayerId>) {
        self.ranks.retain(|r| keep.contains(&r.player));
        self.unranked.retain(|p| keep.contains(p));
    }
}

/// Win/loss line for one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStat {
    pub map: String,
    pub wins: u32,
    pub losses: u32,

    /// Percent, 3 decimals; `None` when the map has no decided matches
    pub win_rate: Option<f64>,

    /// Percent, 3 decimals; `None` when the map has no decided matches
    pub loss_rate: Option<f64>,
}

/// Map performance summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSummary {
    /// Per-map lines, ascending by map name
    pub maps: Vec<MapStat>,

    pub total_wins: u32,
    pub total_losses: u32,

    /// Overall win percent, 3 decimals
    pub overall_win_rate: Option<f64>,

    pub best_map: Option<String>,
    pub worst_map: Option<String>,

    /// Maps whose rates are undefined (0 decided matches)
    pub undefined_maps: Vec<String>,
}

impl MapSummary {
    pub fn get(&self, map: &str) -> Option<&MapStat> {
        self.maps.iter().find(|m| m.map == map)
    }
}

/// One point of the running win rate series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinRatePoint {
    pub date: DateTime<Utc>,
    pub match_id: MatchId,
    pub outcome: Outcome,

    /// Cumulative win fraction up to and including this match
    pub win_rate: f64,
}

/// General statistics for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGeneralStats {
    pub player: PlayerId,
    pub matches: u32,
    pub kills: u32,
    pub kills_per_match: f64,
    pub deaths: u32,
    pub deaths_per_match: f64,
    pub assists: u32,
    pub assists_per_match: f64,

    /// Percent of all shots; `None` when no shots were recorded
    pub headshot_pct: Option<f64>,

    pub first_bloods: u32,
    pub first_duels: u32,
    pub first_deaths: u32,
    pub headshots: u32,
    pub bodyshots: u32,
    pub legshots: u32,

    /// Mean average combat score
    pub avg_acs: f64,

    /// Percent, 2 decimals; `None` without clutch attempts
    pub clutch_pct: Option<f64>,
}

/// Summed kills per agent for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentKillsRow {
    pub player: PlayerId,
    pub by_agent: BTreeMap<String, u32>,
    pub total: u32,
}

/// Shot distribution for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShootingBreakdown {
    pub player: PlayerId,
    pub total_shots: u32,
    pub headshot_pct: f64,
    pub bodyshot_pct: f64,
    pub legshot_pct: f64,
}

/// Team overview for a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamOverview {
    pub team: String,
    pub matches: u32,
    pub wins: u32,

    /// Win fraction, 2 decimals
    pub win_fraction: f64,

    /// Mean game length in minutes, 2 decimals
    pub avg_game_length: f64,

    /// Mean rounds per match, 2 decimals
    pub avg_rounds: f64,

    /// Pistol round win fraction, 3 decimals; only for the tracked team
    pub pistol_win_rate: Option<f64>,

    pub weekly: Vec<WeeklyRow>,
}

/// One week of a team's matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRow {
    /// Monday starting the week
    pub week: NaiveDate,
    pub matches: u32,
    pub avg_game_length: f64,
    pub avg_rounds: f64,
    pub wins: u32,
}

/// Team inferred for one roster side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "team", rename_all = "snake_case")]
pub enum SideTeam {
    Known(String),
    Unknown,
}

impl SideTeam {
    pub fn name(&self) -> Option<&str> {
        match self {
            SideTeam::Known(t) => Some(t.as_str()),
            SideTeam::Unknown => None,
        }
    }
}

/// Team assignment for both sides of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamAssignment {
    pub red: SideTeam,
    pub blue: SideTeam,
}

impl TeamAssignment {
    pub fn unknown() -> Self {
        Self {
            red: SideTeam::Unknown,
            blue: SideTeam::Unknown,
        }
    }
}
