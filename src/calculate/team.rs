//! Team-level overview and weekly breakdown.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{MatchRecord, TeamOverview, WeeklyRow};
use crate::table::{Aggregation, Table};

use super::{ratio, round_to, StatsError};

/// Pistol rounds in one match, one per half.
const PISTOL_ROUNDS_PER_MATCH: f64 = 2.0;

/// Every team label seen on either side, sorted and de-duplicated.
pub fn team_labels(matches: &[MatchRecord]) -> Vec<String> {
    matches
        .iter()
        .flat_map(|m| [m.red_team.as_str(), m.blue_team.as_str()])
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn team_table(matches: &[MatchRecord], team: &str) -> Result<Table, StatsError> {
    let rows: Vec<_> = matches
        .iter()
        .filter(|m| m.involves(team))
        .map(|m| {
            m.to_row()
                .with("week", week_start(m.date.date_naive()).to_string())
                .with("won", u32::from(m.winner == team))
        })
        .collect();
    if rows.is_empty() {
        return Err(StatsError::EmptyInput(format!("no matches for team '{}'", team)));
    }
    Ok(Table::from_rows(rows))
}

/// The Monday starting the week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Summary of one team's matches.
///
/// `tracked_team` is the team whose perspective pistol rounds are recorded
/// from; other teams get no pistol win rate.
pub fn team_overview(
    matches: &[MatchRecord],
    team: &str,
    tracked_team: Option<&str>,
) -> Result<TeamOverview, StatsError> {
    let table = team_table(matches, team)?;
    let totals = table.group_by(
        &[],
        &[
            Aggregation::count("match_id").named("matches"),
            Aggregation::sum("won"),
            Aggregation::mean("game_length"),
            Aggregation::mean("rounds"),
            Aggregation::sum("pistol_wins"),
        ],
    )?;
    let row = totals
        .rows()
        .first()
        .ok_or_else(|| StatsError::EmptyInput(format!("no matches for team '{}'", team)))?;

    let matches_played = row.get("matches").as_i64().unwrap_or(0) as u32;
    let wins = row.get("won").as_i64().unwrap_or(0) as u32;
    let win_fraction = ratio(wins as f64, matches_played as f64, "no matches")?;

    let pistol_win_rate = if tracked_team == Some(team) {
        let pistol_wins = row.f64("pistol_wins").unwrap_or(0.0);
        Some(round_to(
            ratio(pistol_wins, PISTOL_ROUNDS_PER_MATCH * matches_played as f64, "no matches")?,
            3,
        ))
    } else {
        None
    };

    Ok(TeamOverview {
        team: team.to_string(),
        matches: matches_played,
        wins,
        win_fraction: round_to(win_fraction, 2),
        avg_game_length: round_to(row.f64("game_length").unwrap_or(0.0), 2),
        avg_rounds: round_to(row.f64("rounds").unwrap_or(0.0), 2),
        pistol_win_rate,
        weekly: weekly_rows(&table)?,
    })
}

/// Per-week averages for one team, ascending by week.
pub fn weekly_breakdown(matches: &[MatchRecord], team: &str) -> Result<Vec<WeeklyRow>, StatsError> {
    weekly_rows(&team_table(matches, team)?)
}

fn weekly_rows(table: &Table) -> Result<Vec<WeeklyRow>, StatsError> {
    let grouped = table.group_by(
        &["week"],
        &[
            Aggregation::count("match_id").named("matches"),
            Aggregation::mean("game_length"),
            Aggregation::mean("rounds"),
            Aggregation::sum("won"),
        ],
    )?;

    grouped
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let raw = row.get("week").to_string();
            let week = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                StatsError::MalformedRow {
                    row: idx,
                    reason: format!("bad week '{}': {}", raw, e),
                }
            })?;
            Ok(WeeklyRow {
                week,
                matches: row.get("matches").as_i64().unwrap_or(0) as u32,
                avg_game_length: round_to(row.f64("game_length").unwrap_or(0.0), 2),
                avg_rounds: round_to(row.f64("rounds").unwrap_or(0.0), 2),
                wins: row.get("won").as_i64().unwrap_or(0) as u32,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn game(id: &str, day: u32, red: &str, blue: &str, winner: &str, length: f64, rounds: u32) -> MatchRecord {
        // March 2024: the 4th and 11th are Mondays
        let date = Utc.with_ymd_and_hms(2024, 3, day, 20, 0, 0).unwrap();
        MatchRecord::new(id, date, "Ascent")
            .with_teams(red, blue, winner)
            .with_length(length, rounds)
    }

    fn season() -> Vec<MatchRecord> {
        let mut m1 = game("m1", 4, "Alpha", "Bravo", "Alpha", 40.0, 24);
        m1.pistol_wins = 2;
        let mut m2 = game("m2", 6, "Charlie", "Alpha", "Charlie", 30.0, 18);
        m2.pistol_wins = 1;
        let m3 = game("m3", 10, "Alpha", "Delta", "Alpha", 35.0, 21);
        let m4 = game("m4", 12, "Alpha", "Bravo", "Alpha", 45.5, 26);
        let m5 = game("m5", 12, "Bravo", "Charlie", "Bravo", 33.0, 20);
        vec![m1, m2, m3, m4, m5]
    }

    #[test]
    fn test_team_labels() {
        let labels = team_labels(&season());
        assert_eq!(labels, vec!["Alpha", "Bravo", "Charlie", "Delta"]);
    }

    #[test]
    fn test_team_overview() {
        let overview = team_overview(&season(), "Alpha", Some("Alpha")).unwrap();
        assert_eq!(overview.matches, 4);
        assert_eq!(overview.wins, 3);
        assert_eq!(overview.win_fraction, 0.75);
        assert_eq!(overview.avg_game_length, 37.63);
        assert_eq!(overview.avg_rounds, 22.25);
        // 3 pistols won of 8 played
        assert_eq!(overview.pistol_win_rate, Some(0.375));
    }

    #[test]
    fn test_pistol_rate_only_for_tracked_team() {
        let overview = team_overview(&season(), "Bravo", Some("Alpha")).unwrap();
        assert_eq!(overview.pistol_win_rate, None);
        assert_eq!(overview.wins, 1);
        assert_eq!(overview.win_fraction, 0.33);
    }

    #[test]
    fn test_weekly_breakdown_by_monday() {
        let weekly = weekly_breakdown(&season(), "Alpha").unwrap();
        assert_eq!(weekly.len(), 2);
        // the 10th is a Sunday and belongs to the week of the 4th
        assert_eq!(weekly[0].week, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(weekly[0].matches, 3);
        assert_eq!(weekly[0].wins, 2);
        assert_eq!(weekly[0].avg_game_length, 35.0);
        assert_eq!(weekly[0].avg_rounds, 21.0);
        assert_eq!(weekly[1].week, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(weekly[1].wins, 1);
    }

    #[test]
    fn test_unknown_team_is_empty_input() {
        assert!(matches!(
            team_overview(&season(), "Zulu", None),
            Err(StatsError::EmptyInput(_))
        ));
        assert!(weekly_breakdown(&[], "Alpha").is_err());
    }

    #[test]
    fn test_week_start() {
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(week_start(sunday), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        let monday = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        assert_eq!(week_start(monday), monday);
    }
}
