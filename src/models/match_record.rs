//! Match model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::{self, malformed};
use super::{EntityId, MatchId, PlayerId};
use crate::calculate::StatsError;
use crate::table::{Row, Value};

/// Result of a match from the tracked team's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    /// Parse `W`/`Win`/`L`/`Loss` (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "w" | "win" | "won" => Some(Outcome::Win),
            "l" | "loss" | "lost" => Some(Outcome::Loss),
            _ => None,
        }
    }

    pub fn is_win(self) -> bool {
        self == Outcome::Win
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win => write!(f, "Win"),
            Outcome::Loss => write!(f, "Loss"),
        }
    }
}

/// One played match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Match identifier (generated from date/map/teams for legacy rows)
    pub id: MatchId,

    /// When the match was played
    pub date: DateTime<Utc>,

    /// Map name
    pub map: String,

    /// Game length in minutes
    pub game_length: f64,

    /// Rounds played
    pub rounds: u32,

    pub red_team: String,
    pub blue_team: String,
    pub red_score: u32,
    pub blue_score: u32,

    /// Label of the winning team (empty when unknown)
    pub winner: String,

    /// Result for the tracked team, `None` when undetermined
    pub outcome: Option<Outcome>,

    /// Pistol rounds won by the tracked team
    pub pistol_wins: u32,

    pub opponent: Option<String>,

    pub red_roster: Vec<PlayerId>,
    pub blue_roster: Vec<PlayerId>,
}

impl MatchRecord {
    /// Create a match with minimal fields; everything else defaults.
    pub fn new(id: impl Into<MatchId>, date: DateTime<Utc>, map: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date,
            map: map.into(),
            game_length: 0.0,
            rounds: 0,
            red_team: String::new(),
            blue_team: String::new(),
            red_score: 0,
            blue_score: 0,
            winner: String::new(),
            outcome: None,
            pistol_wins: 0,
            opponent: None,
            red_roster: Vec::new(),
            blue_roster: Vec::new(),
        }
    }

    /// Builder method to set the outcome.
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Builder method to set both team labels and the winner.
    pub fn with_teams(mut self, red: &str, blue: &str, winner: &str) -> Self {
        self.red_team = red.to_string();
        self.blue_team = blue.to_string();
        self.winner = winner.to_string();
        self
    }

    /// Builder method to set game length and rounds.
    pub fn with_length(mut self, game_length: f64, rounds: u32) -> Self {
        self.game_length = game_length;
        self.rounds = rounds;
        self
    }

    /// Builder method to set both rosters.
    pub fn with_rosters(mut self, red: &[&str], blue: &[&str]) -> Self {
        self.red_roster = red.iter().map(|p| PlayerId::from(*p)).collect();
        self.blue_roster = blue.iter().map(|p| PlayerId::from(*p)).collect();
        self
    }

    /// Whether `team` played this match.
    pub fn involves(&self, team: &str) -> bool {
        self.red_team == team || self.blue_team == team
    }

    /// Derive the outcome from the winner label for a tracked team.
    ///
    /// Returns `None` if the team did not play or the winner is unknown.
    pub fn outcome_for(&self, team: &str) -> Option<Outcome> {
        if !self.involves(team) || self.winner.is_empty() {
            return None;
        }
        if self.winner == team {
            Some(Outcome::Win)
        } else {
            Some(Outcome::Loss)
        }
    }

    /// Build a match from an adapter row.
    ///
    /// `idx` is the row's position, used in error reports. When `tracked_team`
    /// is set and took part, the outcome is derived from the winner label;
    /// otherwise the `outcome` column is used.
    pub fn from_row(row: &Row, idx: usize, tracked_team: Option<&str>) -> Result<Self, StatsError> {
        let date = fields::timestamp(row, &["date"], idx)?;
        let map = fields::required_text(row, &["map"], idx)?;
        let red_team = fields::opt_text(row, &["red_team", "team1"]).unwrap_or_default();
        let blue_team = fields::opt_text(row, &["blue_team", "team2"]).unwrap_or_default();

        let id = match fields::opt_text(row, &["match_id"]) {
            Some(id) => EntityId::from(id),
            None => EntityId::generate(&[&date.to_rfc3339(), &map, &red_team, &blue_team]),
        };

        let mut record = Self {
            id,
            date,
            map,
            game_length: fields::float(row, &["game_length"], idx)?,
            rounds: fields::count(row, &["rounds"], idx)?,
            red_team,
            blue_team,
            red_score: fields::count(row, &["red_score", "team1_score"], idx)?,
            blue_score: fields::count(row, &["blue_score", "team2_score"], idx)?,
            winner: fields::opt_text(row, &["winner"]).unwrap_or_default(),
            outcome: None,
            pistol_wins: fields::count(row, &["pistol_wins", "pistol_rounds_won"], idx)?,
            opponent: fields::opt_text(row, &["opponent"]),
            red_roster: parse_roster(row.get("red_roster"), idx)?,
            blue_roster: parse_roster(row.get("blue_roster"), idx)?,
        };

        record.outcome = tracked_team
            .and_then(|team| record.outcome_for(team))
            .or_else(|| fields::opt_text(row, &["outcome"]).and_then(|o| Outcome::parse(&o)));

        Ok(record)
    }

    /// Flatten into a row for table operations.
    pub fn to_row(&self) -> Row {
        Row::new()
            .with("match_id", self.id.as_str())
            .with("date", self.date.to_rfc3339())
            .with("map", self.map.as_str())
            .with("game_length", self.game_length)
            .with("rounds", self.rounds)
            .with("red_team", self.red_team.as_str())
            .with("blue_team", self.blue_team.as_str())
            .with("winner", self.winner.as_str())
            .with("outcome", self.outcome.map(|o| o.to_string()))
            .with("wins", u32::from(self.outcome == Some(Outcome::Win)))
            .with("losses", u32::from(self.outcome == Some(Outcome::Loss)))
            .with("pistol_wins", self.pistol_wins)
    }
}

/// Parse a roster cell.
///
/// Accepts a JSON array of identifiers or of objects carrying `puuid` /
/// `riot_id`, or a `;`/`,` separated list.
fn parse_roster(value: &Value, idx: usize) -> Result<Vec<PlayerId>, StatsError> {
    let raw = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Text(s) => s.trim(),
        other => return Err(malformed(idx, format!("roster is not text: {:?}", other))),
    };

    if raw.starts_with('[') {
        let items: Vec<serde_json::Value> = serde_json::from_str(raw)
            .map_err(|e| malformed(idx, format!("roster is not valid JSON: {}", e)))?;
        return Ok(items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(PlayerId::from(s.as_str())),
                serde_json::Value::Object(obj) => obj
                    .get("puuid")
                    .or_else(|| obj.get("riot_id"))
                    .and_then(|v| v.as_str())
                    .map(PlayerId::from),
                _ => None,
            })
            .filter(|id| !id.as_str().is_empty())
            .collect());
    }

    Ok(raw
        .split([';', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PlayerId::from)
        .collect())
}
