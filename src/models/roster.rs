//! Roster reference data: who plays for which team.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::fields;
use super::PlayerId;
use crate::calculate::StatsError;
use crate::table::Row;

/// Maps a (name, tag) pair to a canonical player and team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub tag: String,

    /// Canonical Riot ID
    pub player: PlayerId,

    /// Team label
    pub team: String,

    /// Account id used in match rosters, when known
    pub puuid: Option<String>,
}

impl RosterEntry {
    pub fn new(name: &str, tag: &str, team: &str) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
            player: PlayerId::from_name_tag(name, tag),
            team: team.to_string(),
            puuid: None,
        }
    }

    /// Builder method to set the account id.
    pub fn with_puuid(mut self, puuid: &str) -> Self {
        self.puuid = Some(puuid.to_string());
        self
    }

    /// Build an entry from a roster sheet row.
    pub fn from_row(row: &Row, idx: usize) -> Result<Self, StatsError> {
        let name = fields::required_text(row, &["name"], idx)?;
        let tag = fields::opt_text(row, &["tag"]).unwrap_or_default();
        let player = fields::opt_text(row, &["riot_id", "Riot_IDs"])
            .map(PlayerId::from)
            .unwrap_or_else(|| PlayerId::from_name_tag(&name, &tag));

        Ok(Self {
            name,
            tag,
            player,
            team: fields::required_text(row, &["team"], idx)?,
            puuid: fields::opt_text(row, &["puuid"]),
        })
    }
}

/// Read-only roster lookup for one computation run.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    by_name_tag: HashMap<(String, String), usize>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        let by_name_tag = entries
            .iter()
            .enumerate()
            .map(|(i, e)| ((e.name.to_lowercase(), e.tag.to_lowercase()), i))
            .collect();
        Self {
            entries,
            by_name_tag,
        }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a legacy (name, tag) pair, case-insensitively.
    pub fn resolve(&self, name: &str, tag: &str) -> Option<&RosterEntry> {
        let key = (name.trim().to_lowercase(), tag.trim().to_lowercase());
        self.by_name_tag.get(&key).map(|&i| &self.entries[i])
    }

    /// Team of a canonical player.
    pub fn team_of(&self, player: &PlayerId) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| &e.player == player)
            .map(|e| e.team.as_str())
    }

    /// Identifier → team mapping used for roster matching.
    ///
    /// Both the Riot ID and (when present) the account id resolve to the team.
    pub fn known_teams(&self) -> HashMap<PlayerId, String> {
        let mut known = HashMap::new();
        for entry in &self.entries {
            known.insert(entry.player.clone(), entry.team.clone());
            if let Some(puuid) = &entry.puuid {
                known.insert(PlayerId::from(puuid.as_str()), entry.team.clone());
            }
        }
        known
    }
}
