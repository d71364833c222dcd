//! Infer which known team played each side of a match from its roster.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{MatchRecord, PlayerId, SideTeam, TeamAssignment};

/// Where the blue side's label is taken from once blue qualifies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlueLabelSource {
    /// Blue's own first resolved team
    #[default]
    OwnRoster,

    /// Red's first resolved team (legacy sheets were labelled this way)
    RedRoster,
}

/// Matcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RosterMatchConfig {
    /// Fraction of a side that must resolve to a known team
    pub threshold: f64,

    pub blue_label: BlueLabelSource,
}

impl Default for RosterMatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            blue_label: BlueLabelSource::OwnRoster,
        }
    }
}

/// Resolved teams for one side, in roster order.
struct SideMatch<'a> {
    members: usize,
    resolved: Vec<&'a str>,
}

impl<'a> SideMatch<'a> {
    fn resolve(roster: &[PlayerId], known: &'a HashMap<PlayerId, String>) -> Self {
        Self {
            members: roster.len(),
            resolved: roster
                .iter()
                .filter_map(|id| known.get(id).map(String::as_str))
                .collect(),
        }
    }

    fn first(&self) -> Option<&'a str> {
        self.resolved.first().copied()
    }

    /// Enough members resolve and they all resolve to the same team.
    fn qualifies(&self, threshold: f64) -> bool {
        let Some(first) = self.first() else {
            return false;
        };
        let fraction = self.resolved.len() as f64 / self.members as f64;
        fraction >= threshold && self.resolved.iter().all(|t| *t == first)
    }
}

/// Match both rosters against the known teams.
///
/// Both sides are assigned or neither is.
pub fn match_rosters(
    red: &[PlayerId],
    blue: &[PlayerId],
    known: &HashMap<PlayerId, String>,
    config: &RosterMatchConfig,
) -> TeamAssignment {
    if red.is_empty() || blue.is_empty() {
        return TeamAssignment::unknown();
    }

    let red_side = SideMatch::resolve(red, known);
    let blue_side = SideMatch::resolve(blue, known);

    let red_team = red_side
        .qualifies(config.threshold)
        .then(|| red_side.first())
        .flatten();
    let blue_team = if blue_side.qualifies(config.threshold) {
        match config.blue_label {
            BlueLabelSource::OwnRoster => blue_side.first(),
            BlueLabelSource::RedRoster => red_side.first(),
        }
    } else {
        None
    };

    match (red_team, blue_team) {
        (Some(red), Some(blue)) => TeamAssignment {
            red: SideTeam::Known(red.to_string()),
            blue: SideTeam::Known(blue.to_string()),
        },
        _ => TeamAssignment::unknown(),
    }
}

/// Run the matcher over every match.
///
/// When both sides resolve, empty `red_team` / `blue_team` labels are filled
/// in. Returns the assignment for each match, in input order.
pub fn assign_teams(
    matches: &mut [MatchRecord],
    known: &HashMap<PlayerId, String>,
    config: &RosterMatchConfig,
) -> Vec<TeamAssignment> {
    matches
        .iter_mut()
        .map(|record| {
            let assignment = match_rosters(&record.red_roster, &record.blue_roster, known, config);
            if let (Some(red), Some(blue)) = (assignment.red.name(), assignment.blue.name()) {
                if record.red_team.is_empty() {
                    record.red_team = red.to_string();
                }
                if record.blue_team.is_empty() {
                    record.blue_team = blue.to_string();
                }
            } else {
                debug!("No team assignment for match {}", record.id);
            }
            assignment
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn ids(names: &[&str]) -> Vec<PlayerId> {
        names.iter().map(|n| PlayerId::from(*n)).collect()
    }

    fn known() -> HashMap<PlayerId, String> {
        let mut known = HashMap::new();
        for p in ["a1", "a2", "a3", "a4", "a5"] {
            known.insert(PlayerId::from(p), "Alpha".to_string());
        }
        for p in ["b1", "b2", "b3", "b4", "b5"] {
            known.insert(PlayerId::from(p), "Bravo".to_string());
        }
        known
    }

    fn known_team(name: &str) -> SideTeam {
        SideTeam::Known(name.to_string())
    }

    #[test]
    fn test_four_of_five_resolves() {
        let assignment = match_rosters(
            &ids(&["a1", "a2", "a3", "a4", "stranger"]),
            &ids(&["b1", "b2", "b3", "b4", "b5"]),
            &known(),
            &RosterMatchConfig::default(),
        );
        assert_eq!(assignment.red, known_team("Alpha"));
        assert_eq!(assignment.blue, known_team("Bravo"));
    }

    #[test]
    fn test_below_threshold_is_unknown() {
        let assignment = match_rosters(
            &ids(&["a1", "a2", "a3", "x", "y"]),
            &ids(&["b1", "b2", "b3", "b4", "b5"]),
            &known(),
            &RosterMatchConfig::default(),
        );
        assert_eq!(assignment, TeamAssignment::unknown());
    }

    #[test]
    fn test_mixed_side_is_unknown_for_both() {
        let assignment = match_rosters(
            &ids(&["a1", "a2", "a3", "a4", "b5"]),
            &ids(&["b1", "b2", "b3", "b4"]),
            &known(),
            &RosterMatchConfig::default(),
        );
        assert_eq!(assignment, TeamAssignment::unknown());
    }

    #[test]
    fn test_empty_roster_short_circuits() {
        let config = RosterMatchConfig::default();
        let full = ids(&["a1", "a2", "a3", "a4", "a5"]);
        assert_eq!(
            match_rosters(&full, &[], &known(), &config),
            TeamAssignment::unknown()
        );
        assert_eq!(
            match_rosters(&[], &full, &known(), &config),
            TeamAssignment::unknown()
        );
    }

    #[test]
    fn test_no_resolved_members_is_unknown() {
        let assignment = match_rosters(
            &ids(&["a1", "a2", "a3", "a4", "a5"]),
            &ids(&["x", "y", "z"]),
            &known(),
            &RosterMatchConfig {
                threshold: 0.0,
                ..RosterMatchConfig::default()
            },
        );
        assert_eq!(assignment, TeamAssignment::unknown());
    }

    #[test]
    fn test_blue_label_from_red_roster() {
        let config = RosterMatchConfig {
            blue_label: BlueLabelSource::RedRoster,
            ..RosterMatchConfig::default()
        };
        let assignment = match_rosters(
            &ids(&["a1", "a2", "a3", "a4", "a5"]),
            &ids(&["b1", "b2", "b3", "b4", "b5"]),
            &known(),
            &config,
        );
        assert_eq!(assignment.red, known_team("Alpha"));
        assert_eq!(assignment.blue, known_team("Alpha"));
    }

    #[test]
    fn test_blue_label_from_own_roster() {
        let assignment = match_rosters(
            &ids(&["a1", "a2", "a3", "a4", "a5"]),
            &ids(&["b1", "b2", "b3", "b4", "b5"]),
            &known(),
            &RosterMatchConfig {
                blue_label: BlueLabelSource::OwnRoster,
                ..RosterMatchConfig::default()
            },
        );
        assert_eq!(assignment.blue, known_team("Bravo"));
    }

    #[test]
    fn test_assign_teams_fills_empty_labels_only() {
        let mut matches = vec![
            MatchRecord::new("m1", Utc::now(), "Ascent")
                .with_rosters(&["a1", "a2", "a3", "a4", "a5"], &["b1", "b2", "b3", "b4", "b5"]),
            MatchRecord::new("m2", Utc::now(), "Bind")
                .with_teams("Custom Red", "", "")
                .with_rosters(&["a1", "a2", "a3", "a4", "a5"], &["b1", "b2", "b3", "b4", "b5"]),
            MatchRecord::new("m3", Utc::now(), "Split").with_rosters(&["a1"], &[]),
        ];

        let assignments = assign_teams(&mut matches, &known(), &RosterMatchConfig::default());
        assert_eq!(assignments.len(), 3);
        assert_eq!(matches[0].red_team, "Alpha");
        assert_eq!(matches[0].blue_team, "Bravo");
        assert_eq!(matches[1].red_team, "Custom Red");
        assert_eq!(matches[1].blue_team, "Bravo");
        assert_eq!(assignments[2], TeamAssignment::unknown());
        assert!(matches[2].red_team.is_empty());
    }

    #[test]
    fn test_config_deserialize() {
        let config: RosterMatchConfig =
            serde_json::from_str(r#"{"threshold": 0.6, "blue_label": "red_roster"}"#).unwrap();
        assert_eq!(config.blue_label, BlueLabelSource::RedRoster);
        assert_eq!(config.threshold, 0.6);
    }
}
