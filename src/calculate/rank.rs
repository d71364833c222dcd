//! Percentile ranks within a team and across the whole population.

use std::collections::{BTreeMap, HashMap};

use crate::models::{KdValue, PlayerId, PlayerMatchRecord, PlayerRank, RankReport};
use crate::table::{Aggregation, Table, Value};

use super::{round_to, StatsError};

/// Mean of each player's defined per-record K/D.
///
/// Players whose records all have zero deaths map to `Undefined`.
pub fn mean_kd(records: &[PlayerMatchRecord]) -> Result<BTreeMap<PlayerId, KdValue>, StatsError> {
    if records.is_empty() {
        return Err(StatsError::EmptyInput("no player records".to_string()));
    }

    let table = Table::from_rows(
        records
            .iter()
            .map(|r| {
                r.to_row()
                    .with("kd", r.kd().ok().map(Value::Float).unwrap_or(Value::Null))
            })
            .collect(),
    );
    let grouped = table.group_by(&["player"], &[Aggregation::mean("kd")])?;

    Ok(grouped
        .iter()
        .map(|row| {
            (
                PlayerId::from(row.get("player").to_string()),
                KdValue::from(row.f64("kd")),
            )
        })
        .collect())
}

/// Fraction of `values` that are `<=` each value, rounded to 2 decimals.
///
/// Tied values share the highest rank of their group.
pub fn percentile_rank(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    values
        .iter()
        .map(|v| {
            let at_or_below = values.iter().filter(|other| *other <= v).count() as f64;
            round_to(at_or_below / n, 2)
        })
        .collect()
}

/// Rank every player with a defined metric, globally and within their team.
pub fn compute_ranks(
    metrics: &BTreeMap<PlayerId, KdValue>,
    teams: &HashMap<PlayerId, String>,
) -> Result<RankReport, StatsError> {
    let mut unranked = Vec::new();
    let mut ranked: Vec<(&PlayerId, f64)> = Vec::new();
    for (player, metric) in metrics {
        match metric.value() {
            Some(v) => ranked.push((player, v)),
            None => unranked.push(player.clone()),
        }
    }
    if ranked.is_empty() {
        return Err(StatsError::EmptyInput("no player with a defined metric".to_string()));
    }

    let values: Vec<f64> = ranked.iter().map(|(_, v)| *v).collect();
    let global = percentile_rank(&values);

    let mut by_team: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, (player, _)) in ranked.iter().enumerate() {
        if let Some(team) = teams.get(*player) {
            by_team.entry(team.as_str()).or_default().push(idx);
        }
    }

    let mut team_ranks: Vec<Option<f64>> = vec![None; ranked.len()];
    for members in by_team.values() {
        let team_values: Vec<f64> = members.iter().map(|&i| values[i]).collect();
        for (&i, rank) in members.iter().zip(percentile_rank(&team_values)) {
            team_ranks[i] = Some(rank);
        }
    }

    let ranks = ranked
        .iter()
        .zip(global)
        .zip(team_ranks)
        .map(|(((player, value), global_rank), team_rank)| PlayerRank {
            player: (*player).clone(),
            team: teams.get(*player).cloned(),
            value: *value,
            team_rank,
            global_rank,
        })
        .collect();

    Ok(RankReport { ranks, unranked })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn metrics(entries: &[(&str, Option<f64>)]) -> BTreeMap<PlayerId, KdValue> {
        entries
            .iter()
            .map(|(p, v)| (PlayerId::from(*p), KdValue::from(*v)))
            .collect()
    }

    fn teams(entries: &[(&str, &str)]) -> HashMap<PlayerId, String> {
        entries
            .iter()
            .map(|(p, t)| (PlayerId::from(*p), t.to_string()))
            .collect()
    }

    #[test]
    fn test_percentile_rank_ties_share_max() {
        assert_eq!(
            percentile_rank(&[1.0, 2.0, 2.0, 4.0]),
            vec![0.25, 0.75, 0.75, 1.0]
        );
    }

    #[test]
    fn test_percentile_rank_bounds() {
        let ranks = percentile_rank(&[0.3, 1.7, 0.9, 1.1, 2.4, 0.9]);
        assert!(ranks.iter().all(|r| *r > 0.0 && *r <= 1.0));
        assert_eq!(ranks[4], 1.0);
    }

    #[test]
    fn test_compute_ranks_team_and_global() {
        let report = compute_ranks(
            &metrics(&[
                ("a#1", Some(1.0)),
                ("b#1", Some(2.0)),
                ("c#1", Some(2.0)),
                ("d#1", Some(4.0)),
            ]),
            &teams(&[("a#1", "Alpha"), ("b#1", "Alpha"), ("c#1", "Bravo"), ("d#1", "Bravo")]),
        )
        .unwrap();

        let a = report.get(&PlayerId::from("a#1")).unwrap();
        assert_eq!(a.global_rank, 0.25);
        assert_eq!(a.team_rank, Some(0.5));
        let c = report.get(&PlayerId::from("c#1")).unwrap();
        assert_eq!(c.global_rank, 0.75);
        assert_eq!(c.team_rank, Some(0.5));
        assert_eq!(c.team.as_deref(), Some("Bravo"));
        let d = report.get(&PlayerId::from("d#1")).unwrap();
        assert_eq!(d.team_rank, Some(1.0));
    }

    #[test]
    fn test_player_without_team_has_no_team_rank() {
        let report = compute_ranks(
            &metrics(&[("a#1", Some(1.0)), ("free#9", Some(3.0))]),
            &teams(&[("a#1", "Alpha")]),
        )
        .unwrap();
        let free = report.get(&PlayerId::from("free#9")).unwrap();
        assert_eq!(free.team_rank, None);
        assert_eq!(free.global_rank, 1.0);
        // a lone team member is at the top of their own team
        assert_eq!(report.get(&PlayerId::from("a#1")).unwrap().team_rank, Some(1.0));
    }

    #[test]
    fn test_undefined_metric_is_unranked() {
        let report = compute_ranks(
            &metrics(&[("a#1", Some(1.0)), ("b#1", None), ("c#1", Some(3.0))]),
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(report.unranked, vec![PlayerId::from("b#1")]);
        assert_eq!(report.ranks.len(), 2);
        assert_eq!(report.get(&PlayerId::from("a#1")).unwrap().global_rank, 0.5);
    }

    #[test]
    fn test_all_undefined_is_empty_input() {
        let result = compute_ranks(&metrics(&[("a#1", None)]), &HashMap::new());
        assert!(matches!(result, Err(StatsError::EmptyInput(_))));
    }

    #[test]
    fn test_mean_kd_skips_zero_death_records() {
        let records = vec![
            PlayerMatchRecord::new("a#1", "m1", "Jett", 20, 10),
            PlayerMatchRecord::new("a#1", "m2", "Jett", 9, 0),
            PlayerMatchRecord::new("a#1", "m3", "Omen", 10, 10),
            PlayerMatchRecord::new("z#1", "m1", "Sage", 4, 0),
        ];
        let kd = mean_kd(&records).unwrap();
        assert_eq!(kd.get(&PlayerId::from("a#1")), Some(&KdValue::Defined(1.5)));
        assert_eq!(kd.get(&PlayerId::from("z#1")), Some(&KdValue::Undefined));
    }

    #[test]
    fn test_idempotent() {
        let m = metrics(&[("a#1", Some(1.2)), ("b#1", Some(0.8))]);
        let t = teams(&[("a#1", "Alpha"), ("b#1", "Alpha")]);
        assert_eq!(compute_ranks(&m, &t).unwrap(), compute_ranks(&m, &t).unwrap());
    }
}
