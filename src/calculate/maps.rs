//! Win/loss summary per map.

use tracing::debug;

use crate::models::{MapStat, MapSummary, MatchRecord};
use crate::table::{Aggregation, Table};

use super::{calculate_win_rate, round_to, StatsError};

/// Summarize wins and losses per map with best and worst maps.
///
/// Rates are percentages rounded to 3 decimals. A map with no decided match
/// has no rates and is left out of best/worst selection.
pub fn summarize_maps(matches: &[MatchRecord]) -> Result<MapSummary, StatsError> {
    if matches.is_empty() {
        return Err(StatsError::EmptyInput("no matches in range".to_string()));
    }

    let table = Table::from_rows(matches.iter().map(MatchRecord::to_row).collect());
    let grouped = table.group_by(
        &["map"],
        &[Aggregation::sum("wins"), Aggregation::sum("losses")],
    )?;

    let mut maps = Vec::with_capacity(grouped.len());
    let mut undefined_maps = Vec::new();
    for row in grouped.iter() {
        let map = row.get("map").to_string();
        let wins = row.get("wins").as_i64().unwrap_or(0) as u32;
        let losses = row.get("losses").as_i64().unwrap_or(0) as u32;

        let (win_rate, loss_rate) = match calculate_win_rate(wins, losses) {
            Ok(rate) => (Some(round_to(rate, 3)), Some(round_to(100.0 - rate, 3))),
            Err(err) => {
                debug!("Map {} has undefined rates: {}", map, err);
                undefined_maps.push(map.clone());
                (None, None)
            }
        };

        maps.push(MapStat {
            map,
            wins,
            losses,
            win_rate,
            loss_rate,
        });
    }

    let total_wins: u32 = maps.iter().map(|m| m.wins).sum();
    let total_losses: u32 = maps.iter().map(|m| m.losses).sum();
    let overall_win_rate = calculate_win_rate(total_wins, total_losses)
        .ok()
        .map(|r| round_to(r, 3));

    Ok(MapSummary {
        best_map: best_map(&maps),
        worst_map: worst_map(&maps),
        maps,
        total_wins,
        total_losses,
        overall_win_rate,
        undefined_maps,
    })
}

/// Most wins, then highest win rate; alphabetical order breaks remaining ties.
fn best_map(maps: &[MapStat]) -> Option<String> {
    let mut ranked: Vec<(&MapStat, f64)> = maps
        .iter()
        .filter_map(|m| m.win_rate.map(|r| (m, r)))
        .collect();
    ranked.sort_by(|(a, ra), (b, rb)| b.wins.cmp(&a.wins).then_with(|| rb.total_cmp(ra)));
    ranked.first().map(|(m, _)| m.map.clone())
}

/// Highest loss rate; the alphabetically first map wins ties.
fn worst_map(maps: &[MapStat]) -> Option<String> {
    let mut worst: Option<(&MapStat, f64)> = None;
    for (map, rate) in maps.iter().filter_map(|m| m.loss_rate.map(|r| (m, r))) {
        match worst {
            Some((_, best_rate)) if rate <= best_rate => {}
            _ => worst = Some((map, rate)),
        }
    }
    worst.map(|(m, _)| m.map.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Outcome::{self, Loss, Win};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn games(map: &str, outcomes: &[Option<Outcome>]) -> Vec<MatchRecord> {
        outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let date = Utc.with_ymd_and_hms(2024, 5, 1 + i as u32, 18, 0, 0).unwrap();
                let mut m = MatchRecord::new(format!("{}-{}", map, i), date, map);
                m.outcome = *o;
                m
            })
            .collect()
    }

    #[test]
    fn test_best_and_worst() {
        let mut matches = games("A", &[Some(Win), Some(Win), Some(Win), Some(Loss)]);
        matches.extend(games("B", &[Some(Win), Some(Loss), Some(Loss), Some(Loss)]));

        let summary = summarize_maps(&matches).unwrap();
        assert_eq!(summary.best_map.as_deref(), Some("A"));
        assert_eq!(summary.worst_map.as_deref(), Some("B"));
        assert_eq!(summary.get("A").unwrap().win_rate, Some(75.0));
        assert_eq!(summary.get("B").unwrap().loss_rate, Some(75.0));
        assert_eq!(summary.total_wins, 4);
        assert_eq!(summary.total_losses, 4);
        assert_eq!(summary.overall_win_rate, Some(50.0));
    }

    #[test]
    fn test_rates_rounded_to_three_places() {
        let summary = summarize_maps(&games("Bind", &[Some(Win), Some(Loss), Some(Loss)])).unwrap();
        let bind = summary.get("Bind").unwrap();
        assert_eq!(bind.win_rate, Some(33.333));
        assert_eq!(bind.loss_rate, Some(66.667));
    }

    #[test]
    fn test_best_ties_broken_by_win_rate_then_name() {
        let mut matches = games("Split", &[Some(Win), Some(Win)]);
        matches.extend(games("Haven", &[Some(Win), Some(Win), Some(Loss)]));
        matches.extend(games("Ascent", &[Some(Win), Some(Win), Some(Loss)]));

        let summary = summarize_maps(&matches).unwrap();
        assert_eq!(summary.best_map.as_deref(), Some("Split"));
        // Ascent and Haven tie on loss rate; alphabetical first wins
        assert_eq!(summary.worst_map.as_deref(), Some("Ascent"));
    }

    #[test]
    fn test_undecided_only_map_is_undefined() {
        let mut matches = games("Lotus", &[None, None]);
        matches.extend(games("Pearl", &[Some(Loss)]));

        let summary = summarize_maps(&matches).unwrap();
        let lotus = summary.get("Lotus").unwrap();
        assert_eq!(lotus.win_rate, None);
        assert_eq!(lotus.loss_rate, None);
        assert_eq!(summary.undefined_maps, vec!["Lotus".to_string()]);
        assert_eq!(summary.best_map.as_deref(), Some("Pearl"));
        assert_eq!(summary.worst_map.as_deref(), Some("Pearl"));
    }

    #[test]
    fn test_maps_sorted_by_name() {
        let mut matches = games("Sunset", &[Some(Win)]);
        matches.extend(games("Abyss", &[Some(Loss)]));
        let summary = summarize_maps(&matches).unwrap();
        let names: Vec<_> = summary.maps.iter().map(|m| m.map.as_str()).collect();
        assert_eq!(names, vec!["Abyss", "Sunset"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(summarize_maps(&[]), Err(StatsError::EmptyInput(_))));
    }

    #[test]
    fn test_idempotent() {
        let matches = games("Icebox", &[Some(Win), None, Some(Loss)]);
        assert_eq!(summarize_maps(&matches).unwrap(), summarize_maps(&matches).unwrap());
    }
}
