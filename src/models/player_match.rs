//! Per-player match performance model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields;
use super::{MatchId, PlayerId};
use crate::calculate::StatsError;
use crate::table::Row;

/// One player's performance within one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMatchRecord {
    /// Riot ID (`name#tag`)
    pub player: PlayerId,

    /// Match this performance belongs to
    pub match_id: MatchId,

    /// Agent played
    pub agent: String,

    /// Map, denormalized from the match
    pub map: Option<String>,

    /// Match date, denormalized from the match
    pub date: Option<DateTime<Utc>>,

    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub first_bloods: u32,
    pub first_duels: u32,
    pub first_deaths: u32,
    pub headshots: u32,
    pub bodyshots: u32,
    pub legshots: u32,

    /// Average combat score
    pub acs: f64,

    pub clutch_wins: u32,
    pub clutch_attempts: u32,

    /// Team from the roster, `None` when unresolved
    pub team: Option<String>,
}

impl PlayerMatchRecord {
    /// Create a record with a kill/death line; all other counters are zero.
    pub fn new(
        player: impl Into<PlayerId>,
        match_id: impl Into<MatchId>,
        agent: impl Into<String>,
        kills: u32,
        deaths: u32,
    ) -> Self {
        Self {
            player: player.into(),
            match_id: match_id.into(),
            agent: agent.into(),
            map: None,
            date: None,
            kills,
            deaths,
            assists: 0,
            first_bloods: 0,
            first_duels: 0,
            first_deaths: 0,
            headshots: 0,
            bodyshots: 0,
            legshots: 0,
            acs: 0.0,
            clutch_wins: 0,
            clutch_attempts: 0,
            team: None,
        }
    }

    /// Builder method to set the map.
    pub fn with_map(mut self, map: &str) -> Self {
        self.map = Some(map.to_string());
        self
    }

    /// Builder method to set the team.
    pub fn with_team(mut self, team: &str) -> Self {
        self.team = Some(team.to_string());
        self
    }

    /// Builder method to set the shot breakdown.
    pub fn with_shots(mut self, headshots: u32, bodyshots: u32, legshots: u32) -> Self {
        self.headshots = headshots;
        self.bodyshots = bodyshots;
        self.legshots = legshots;
        self
    }

    /// Builder method to set clutch results.
    pub fn with_clutches(mut self, wins: u32, attempts: u32) -> Self {
        self.clutch_wins = wins;
        self.clutch_attempts = attempts;
        self
    }

    /// Kill/death ratio, or `DivisionByZero` when the player never died.
    pub fn kd(&self) -> Result<f64, StatsError> {
        if self.deaths == 0 {
            return Err(StatsError::DivisionByZero(format!(
                "{} had 0 deaths in match {}",
                self.player, self.match_id
            )));
        }
        Ok(self.kills as f64 / self.deaths as f64)
    }

    /// Total recorded shots.
    pub fn total_shots(&self) -> u32 {
        self.headshots + self.bodyshots + self.legshots
    }

    /// Build a record from an adapter row.
    ///
    /// The player key is the `riot_id` column, falling back to `name` + `tag`.
    pub fn from_row(row: &Row, idx: usize) -> Result<Self, StatsError> {
        let player = match fields::opt_text(row, &["riot_id", "Riot_IDs"]) {
            Some(id) => PlayerId::from(id),
            None => {
                let name = fields::required_text(row, &["name"], idx)?;
                let tag = fields::opt_text(row, &["tag"]).unwrap_or_default();
                PlayerId::from_name_tag(&name, &tag)
            }
        };

        Ok(Self {
            player,
            match_id: fields::required_text(row, &["match_id"], idx)?.into(),
            agent: fields::required_text(row, &["agent"], idx)?,
            map: fields::opt_text(row, &["map"]),
            date: match fields::opt_text(row, &["date"]) {
                Some(raw) => Some(
                    fields::parse_timestamp(&raw)
                        .ok_or_else(|| fields::malformed(idx, format!("unparseable date '{}'", raw)))?,
                ),
                None => None,
            },
            kills: fields::count(row, &["kills"], idx)?,
            deaths: fields::count(row, &["deaths"], idx)?,
            assists: fields::count(row, &["assists"], idx)?,
            first_bloods: fields::count(row, &["first_bloods"], idx)?,
            first_duels: fields::count(row, &["first_duels"], idx)?,
            first_deaths: fields::count(row, &["first_deaths"], idx)?,
            headshots: fields::count(row, &["headshots"], idx)?,
            bodyshots: fields::count(row, &["bodyshots"], idx)?,
            legshots: fields::count(row, &["legshots"], idx)?,
            acs: fields::float(row, &["acs"], idx)?,
            clutch_wins: fields::count(row, &["clutch_wins"], idx)?,
            clutch_attempts: fields::count(row, &["clutch_attempts", "clutch_counts"], idx)?,
            team: fields::opt_text(row, &["team"]),
        })
    }

    /// Flatten into a row for table operations.
    pub fn to_row(&self) -> Row {
        Row::new()
            .with("player", self.player.as_str())
            .with("match_id", self.match_id.as_str())
            .with("agent", self.agent.as_str())
            .with("map", self.map.clone())
            .with("date", self.date.map(|d| d.to_rfc3339()))
            .with("kills", self.kills)
            .with("deaths", self.deaths)
            .with("assists", self.assists)
            .with("first_bloods", self.first_bloods)
            .with("first_duels", self.first_duels)
            .with("first_deaths", self.first_deaths)
            .with("headshots", self.headshots)
            .with("bodyshots", self.bodyshots)
            .with("legshots", self.legshots)
            .with("acs", self.acs)
            .with("clutch_wins", self.clutch_wins)
            .with("clutch_attempts", self.clutch_attempts)
            .with("team", self.team.clone())
    }
}
