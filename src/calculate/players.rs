//! Per-player summary tables.

use std::collections::BTreeMap;

use crate::models::{AgentKillsRow, PlayerGeneralStats, PlayerId, PlayerMatchRecord, ShootingBreakdown};
use crate::table::{AggFunc, Aggregation, Row, Table, Value};

use super::{ratio, round_to, StatsError};

const SUMMED: [&str; 12] = [
    "kills",
    "deaths",
    "assists",
    "first_bloods",
    "first_duels",
    "first_deaths",
    "headshots",
    "bodyshots",
    "legshots",
    "clutch_wins",
    "clutch_attempts",
    "shots",
];

fn records_table(records: &[PlayerMatchRecord]) -> Result<Table, StatsError> {
    if records.is_empty() {
        return Err(StatsError::EmptyInput("no player records".to_string()));
    }
    Ok(Table::from_rows(
        records
            .iter()
            .map(|r| r.to_row().with("shots", r.total_shots()))
            .collect(),
    ))
}

fn count(row: &Row, column: &str) -> u32 {
    row.get(column).as_i64().unwrap_or(0) as u32
}

/// Totals and per-match averages for every player.
///
/// Sorted by kills descending, then player id.
pub fn general_stats(records: &[PlayerMatchRecord]) -> Result<Vec<PlayerGeneralStats>, StatsError> {
    let table = records_table(records)?;

    let mut aggregations: Vec<Aggregation> = SUMMED.iter().map(|c| Aggregation::sum(c)).collect();
    aggregations.push(Aggregation::mean("acs").named("avg_acs"));
    aggregations.push(Aggregation::count("match_id").named("matches"));
    let grouped = table.group_by(&["player"], &aggregations)?;

    let mut stats: Vec<PlayerGeneralStats> = grouped
        .iter()
        .map(|row| {
            let matches = count(row, "matches");
            let per_match = |column: &str| round_to(count(row, column) as f64 / matches.max(1) as f64, 2);
            let shots = count(row, "shots");
            let clutch_attempts = count(row, "clutch_attempts");

            PlayerGeneralStats {
                player: PlayerId::from(row.get("player").to_string()),
                matches,
                kills: count(row, "kills"),
                kills_per_match: per_match("kills"),
                deaths: count(row, "deaths"),
                deaths_per_match: per_match("deaths"),
                assists: count(row, "assists"),
                assists_per_match: per_match("assists"),
                headshot_pct: ratio(count(row, "headshots") as f64 * 100.0, shots as f64, "no shots")
                    .ok()
                    .map(|p| round_to(p, 2)),
                first_bloods: count(row, "first_bloods"),
                first_duels: count(row, "first_duels"),
                first_deaths: count(row, "first_deaths"),
                headshots: count(row, "headshots"),
                bodyshots: count(row, "bodyshots"),
                legshots: count(row, "legshots"),
                avg_acs: round_to(row.f64("avg_acs").unwrap_or(0.0), 2),
                clutch_pct: ratio(
                    count(row, "clutch_wins") as f64 * 100.0,
                    clutch_attempts as f64,
                    "no clutch attempts",
                )
                .ok()
                .map(|p| round_to(p, 2)),
            }
        })
        .collect();

    stats.sort_by(|a, b| b.kills.cmp(&a.kills).then_with(|| a.player.cmp(&b.player)));
    Ok(stats)
}

/// Summed kills per player and agent, with a total column.
pub fn kills_by_agent(records: &[PlayerMatchRecord]) -> Result<Vec<AgentKillsRow>, StatsError> {
    let table = records_table(records)?;
    let pivot = table.pivot("player", "agent", "kills", AggFunc::Sum)?;
    let agents: Vec<String> = pivot.columns().iter().skip(1).cloned().collect();

    let defaults: Vec<(&str, Value)> = agents.iter().map(|a| (a.as_str(), Value::Int(0))).collect();
    Ok(pivot
        .fill_missing_with(&defaults)
        .iter()
        .map(|row| {
            let by_agent: BTreeMap<String, u32> = agents
                .iter()
                .map(|a| (a.clone(), count(row, a)))
                .collect();
            AgentKillsRow {
                player: PlayerId::from(row.get("player").to_string()),
                total: by_agent.values().sum(),
                by_agent,
            }
        })
        .collect())
}

/// Head/body/leg shot shares per player, in percent of all recorded shots.
///
/// Players without recorded shots are left out. Sorted by total shots
/// descending, then player id.
pub fn shooting_breakdown(records: &[PlayerMatchRecord]) -> Result<Vec<ShootingBreakdown>, StatsError> {
    let table = records_table(records)?;
    let grouped = table.group_by(
        &["player"],
        &[
            Aggregation::sum("headshots"),
            Aggregation::sum("bodyshots"),
            Aggregation::sum("legshots"),
            Aggregation::sum("shots"),
        ],
    )?;

    let mut rows: Vec<ShootingBreakdown> = grouped
        .iter()
        .filter(|row| count(row, "shots") > 0)
        .map(|row| {
            let total = count(row, "shots") as f64;
            let share = |column: &str| round_to(count(row, column) as f64 * 100.0 / total, 2);
            ShootingBreakdown {
                player: PlayerId::from(row.get("player").to_string()),
                total_shots: count(row, "shots"),
                headshot_pct: share("headshots"),
                bodyshot_pct: share("bodyshots"),
                legshot_pct: share("legshots"),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_shots
            .cmp(&a.total_shots)
            .then_with(|| a.player.cmp(&b.player))
    });
    Ok(rows)
}
