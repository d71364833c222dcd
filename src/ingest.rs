//! Ingestion pipeline.
//!
//! Turns raw sheet rows into a typed [`Dataset`] ready for the calculation
//! layer:
//! 1. match sheets concatenated (legacy first)
//! 2. fill policy for integer and float columns
//! 3. typed conversion, dropping malformed rows
//! 4. Riot ID resolution from the roster
//! 5. retired players removed
//! 6. player rows joined to their match for date and map
//! 7. roster team attached to each player row
//! 8. date range applied
//! 9. teams inferred for each match from its rosters

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculate::{assign_teams, StatsError};
use crate::config::StatsConfig;
use crate::fetch::FetchError;
use crate::models::{MatchRecord, PlayerId, PlayerMatchRecord, Roster, RosterEntry, TeamAssignment};
use crate::storage::StorageError;
use crate::table::{Table, Value};

/// Errors raised while loading a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),
}

/// The sheets a data source provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sheet {
    Matches,
    Players,
    Roster,
}

impl fmt::Display for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sheet::Matches => write!(f, "matches"),
            Sheet::Players => write!(f, "players"),
            Sheet::Roster => write!(f, "roster"),
        }
    }
}

/// Anything that can hand out raw sheet rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn load(&self, sheet: Sheet) -> Result<Table, IngestError>;
}

/// Inclusive date range; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, IngestError> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(IngestError::InvalidRange(format!("{} is after {}", f, t)));
            }
        }
        Ok(Self { from, to })
    }

    /// Parse optional `YYYY-MM-DD` bounds.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, IngestError> {
        let parse = |raw: Option<&str>| -> Result<Option<NaiveDate>, IngestError> {
            raw.map(|s| {
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                    IngestError::InvalidRange(format!("expected YYYY-MM-DD, got '{}'", s))
                })
            })
            .transpose()
        };
        Self::new(parse(from)?, parse(to)?)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether the date part of `when` falls within the range.
    pub fn contains(&self, when: DateTime<Utc>) -> bool {
        let day = when.date_naive();
        self.from.map_or(true, |f| day >= f) && self.to.map_or(true, |t| day <= t)
    }

    /// Undated records only pass an unbounded range.
    fn contains_opt(&self, when: Option<DateTime<Utc>>) -> bool {
        match when {
            Some(when) => self.contains(when),
            None => self.is_unbounded(),
        }
    }
}

/// Typed, filtered data for one computation run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub matches: Vec<MatchRecord>,
    pub players: Vec<PlayerMatchRecord>,
    pub roster: Roster,

    /// Team assignment per match, parallel to `matches`
    pub assignments: Vec<TeamAssignment>,

    /// Rows dropped as malformed
    pub dropped_rows: usize,
}

impl Dataset {
    /// Player records, optionally restricted to one player or team.
    pub fn players_where(&self, player: Option<&str>, team: Option<&str>) -> Vec<PlayerMatchRecord> {
        self.players
            .iter()
            .filter(|p| player.map_or(true, |id| p.player.as_str().eq_ignore_ascii_case(id)))
            .filter(|p| team.map_or(true, |t| p.team.as_deref() == Some(t)))
            .cloned()
            .collect()
    }

    /// Matches seen from `team`'s side, outcomes re-derived from the winner.
    ///
    /// Without a team the tracked-team outcomes are returned unchanged.
    pub fn matches_for(&self, team: Option<&str>) -> Vec<MatchRecord> {
        match team {
            None => self.matches.clone(),
            Some(team) => self
                .matches
                .iter()
                .filter(|m| m.involves(team))
                .map(|m| {
                    let mut record = m.clone();
                    record.outcome = m.outcome_for(team);
                    record
                })
                .collect(),
        }
    }

    /// Each player's team, taken from the first record that carries one.
    pub fn player_teams(&self) -> HashMap<PlayerId, String> {
        let mut teams = HashMap::new();
        for record in &self.players {
            if let Some(team) = &record.team {
                teams
                    .entry(record.player.clone())
                    .or_insert_with(|| team.clone());
            }
        }
        teams
    }
}

/// Loads datasets from a row source.
pub struct DataLoader<S: ?Sized> {
    source: Arc<S>,
    settings: StatsConfig,
}

impl<S: RowSource + ?Sized> DataLoader<S> {
    pub fn new(source: Arc<S>, settings: StatsConfig) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &StatsConfig {
        &self.settings
    }

    /// Load all sheets and build a dataset for `range`.
    pub async fn load(&self, range: &DateRange) -> Result<Dataset, IngestError> {
        let matches = self.source.load(Sheet::Matches).await?;
        let players = self.source.load(Sheet::Players).await?;
        let roster = self.source.load(Sheet::Roster).await?;
        build_dataset(matches, players, roster, &self.settings, range)
    }
}

/// Apply the fill policy to the columns present in `table`.
///
/// Integer columns get `0` for missing cells, float columns `0.0`. Cells that
/// cannot be coerced are left as they are and fail typed conversion later.
pub fn apply_fill_policy(mut table: Table, settings: &StatsConfig) -> Table {
    for column in &settings.integer_columns {
        if table.has_column(column) {
            table = table.with_column(column, |row| {
                let value = row.get(column);
                if value.is_null() {
                    Value::Int(0)
                } else {
                    value.coerce_int().unwrap_or_else(|| value.clone())
                }
            });
        }
    }
    for column in &settings.float_columns {
        if table.has_column(column) {
            table = table.with_column(column, |row| {
                let value = row.get(column);
                if value.is_null() {
                    Value::Float(0.0)
                } else {
                    value.coerce_float().unwrap_or_else(|| value.clone())
                }
            });
        }
    }
    table
}

/// Build a dataset from raw sheet tables.
pub fn build_dataset(
    matches: Table,
    players: Table,
    roster: Table,
    settings: &StatsConfig,
    range: &DateRange,
) -> Result<Dataset, IngestError> {
    let matches = apply_fill_policy(matches, settings);
    let players = apply_fill_policy(players, settings);
    let mut dropped_rows = 0;

    let roster = Roster::new(
        roster
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| match RosterEntry::from_row(row, idx) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping roster row: {}", e);
                    dropped_rows += 1;
                    None
                }
            })
            .collect(),
    );

    let tracked_team = settings.tracked_team.as_deref();
    let mut match_records: Vec<MatchRecord> = Vec::with_capacity(matches.len());
    for (idx, row) in matches.iter().enumerate() {
        match MatchRecord::from_row(row, idx, tracked_team) {
            Ok(record) => match_records.push(record),
            Err(e) => {
                warn!("Skipping match row: {}", e);
                dropped_rows += 1;
            }
        }
    }

    let retired: HashSet<PlayerId> = settings
        .retired_players
        .iter()
        .map(|p| PlayerId::from(p.as_str()))
        .collect();

    let mut player_records: Vec<PlayerMatchRecord> = Vec::with_capacity(players.len());
    for (idx, row) in players.iter().enumerate() {
        let mut row = row.clone();
        // legacy rows carry name + tag; the roster knows the canonical id
        if row.get("riot_id").is_null() {
            let tag = row.get("tag").to_string();
            if let Some(entry) = row.text("name").and_then(|name| roster.resolve(name, &tag)) {
                let id = entry.player.as_str().to_string();
                row.set("riot_id", id);
            }
        }

        match PlayerMatchRecord::from_row(&row, idx) {
            Ok(record) if retired.contains(&record.player) => {
                debug!("Dropping retired player {}", record.player);
            }
            Ok(record) => player_records.push(record),
            Err(e) => {
                warn!("Skipping player row: {}", e);
                dropped_rows += 1;
            }
        }
    }

    let by_match: HashMap<&str, &MatchRecord> =
        match_records.iter().map(|m| (m.id.as_str(), m)).collect();
    for record in &mut player_records {
        if let Some(m) = by_match.get(record.match_id.as_str()) {
            record.date = record.date.or(Some(m.date));
            if record.map.is_none() {
                record.map = Some(m.map.clone());
            }
        }
        if record.team.is_none() {
            record.team = roster.team_of(&record.player).map(str::to_string);
        }
    }

    match_records.retain(|m| range.contains(m.date));
    player_records.retain(|p| range.contains_opt(p.date));

    let known = roster.known_teams();
    let assignments = assign_teams(&mut match_records, &known, &settings.roster_match());

    info!(
        "Built dataset: {} matches, {} player rows, {} roster entries ({} dropped)",
        match_records.len(),
        player_records.len(),
        roster.entries().len(),
        dropped_rows
    );

    Ok(Dataset {
        matches: match_records,
        players: player_records,
        roster,
        assignments,
        dropped_rows,
    })
}
