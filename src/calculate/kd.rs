//! Play-weighted kill/death ratios.
//!
//! Each record's K/D is weighted by how often the player played that agent,
//! so a rarely played, high-variance agent does not pull the player's average
//! as hard as their main. Records with zero deaths have no defined ratio and
//! are left out of every average instead of poisoning it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::models::{ExcludedRatio, KdReport, KdRow, KdValue, PlayerId, PlayerMatchRecord};
use crate::table::{AggFunc, Aggregation, JoinKind, Row, Table, Value};

use super::StatsError;

const KD: &str = "kd";
const WEIGHT: &str = "weight";

/// Compute weighted K/D per player plus agent and map pivots.
pub fn weighted_kd(records: &[PlayerMatchRecord]) -> Result<KdReport, StatsError> {
    if records.is_empty() {
        return Err(StatsError::EmptyInput("no player records".to_string()));
    }

    let mut excluded = Vec::new();
    let mut table = Table::default();
    for record in records {
        let kd = match record.kd() {
            Ok(kd) => Value::Float(kd),
            Err(err) => {
                debug!("Excluding K/D for {}: {}", record.player, err);
                excluded.push(ExcludedRatio {
                    player: record.player.clone(),
                    match_id: record.match_id.clone(),
                    reason: err.to_string(),
                });
                Value::Null
            }
        };
        table.push(record.to_row().with(KD, kd));
    }

    // weight = plays of (player, agent), zero-death matches included
    let weights = table.group_by(
        &["player", "agent"],
        &[Aggregation::count("match_id").named(WEIGHT)],
    )?;
    let weighted = table
        .join(&weights, &["player", "agent"], JoinKind::Inner)?
        .with_column("kd_x_weight", |row| match (row.f64(KD), row.f64(WEIGHT)) {
            (Some(kd), Some(w)) => Value::Float(kd * w),
            _ => Value::Null,
        })
        .with_column("defined_weight", |row| {
            if row.get(KD).is_null() {
                Value::Null
            } else {
                row.get(WEIGHT).clone()
            }
        });

    let per_player = weighted.group_by(
        &["player"],
        &[
            Aggregation::sum("kd_x_weight"),
            Aggregation::sum("defined_weight"),
            Aggregation::count("match_id").named("matches"),
        ],
    )?;

    let by_agent = pivot_cells(&table, "agent")?;
    let by_map = pivot_cells(&table, "map")?;

    let mut rows: Vec<KdRow> = per_player
        .iter()
        .map(|row| {
            let player = PlayerId::from(row.get("player").to_string());
            let weight_sum = row.f64("defined_weight").unwrap_or(0.0);
            let weighted_kd = if weight_sum > 0.0 {
                KdValue::from(row.f64("kd_x_weight").map(|s| s / weight_sum))
            } else {
                KdValue::Undefined
            };
            KdRow {
                weighted_kd,
                matches: row.get("matches").as_i64().unwrap_or(0) as u32,
                by_agent: fill_columns(&by_agent, &player),
                by_map: fill_columns(&by_map, &player),
                player,
            }
        })
        .collect();

    sort_rows(&mut rows);

    Ok(KdReport {
        agents: by_agent.columns,
        maps: by_map.columns,
        rows,
        excluded,
    })
}

/// Pivot cells keyed by player, with the ordered column list.
struct PivotCells {
    columns: Vec<String>,
    cells: HashMap<String, Row>,
}

fn pivot_cells(table: &Table, column: &str) -> Result<PivotCells, StatsError> {
    let pivot = table.pivot("player", column, KD, AggFunc::Mean)?;
    // every seen key gets a column, even when all its ratios were undefined
    let columns: Vec<String> = table
        .column_values(column)?
        .into_iter()
        .filter(|v| !v.is_null())
        .map(|v| v.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let defaults: Vec<(&str, Value)> = columns
        .iter()
        .map(|c| (c.as_str(), Value::Float(0.0)))
        .collect();
    let cells = pivot
        .fill_missing_with(&defaults)
        .into_rows()
        .into_iter()
        .map(|row| (row.get("player").to_string(), row))
        .collect();
    Ok(PivotCells { columns, cells })
}

/// One player's row of a pivot; players absent from the pivot get all zeros.
fn fill_columns(pivot: &PivotCells, player: &PlayerId) -> BTreeMap<String, f64> {
    let row = pivot.cells.get(player.as_str());
    pivot
        .columns
        .iter()
        .map(|c| {
            let value = row.and_then(|r| r.f64(c)).unwrap_or(0.0);
            (c.clone(), value)
        })
        .collect()
}

/// Weighted K/D descending, ties by player id; undefined rows last.
fn sort_rows(rows: &mut [KdRow]) {
    rows.sort_by(|a, b| match (a.weighted_kd.value(), b.weighted_kd.value()) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.player.cmp(&b.player)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.player.cmp(&b.player),
    });
}
