//! In-memory tabular records.
//!
//! A small relational toolkit shared by every computation:
//! - filter, select and derived columns
//! - group-by with sum / mean / count
//! - inner and left joins on one or more keys
//! - pivots (row key x column key -> aggregated value)
//! - stable multi-key sorting and fill-missing
//!
//! All operations are deterministic for a given input order. Groups, pivot rows
//! and pivot columns are emitted in ascending key order.

mod value;

pub use value::*;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::calculate::StatsError;

/// Aggregation function for [`Table::group_by`] and [`Table::pivot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Sum,
    Mean,
    Count,
}

/// An aggregation over one column, written to `alias`.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub column: String,
    pub func: AggFunc,
    pub alias: String,
}

impl Aggregation {
    pub fn new(column: &str, func: AggFunc) -> Self {
        Self {
            column: column.to_string(),
            func,
            alias: column.to_string(),
        }
    }

    pub fn sum(column: &str) -> Self {
        Self::new(column, AggFunc::Sum)
    }

    pub fn mean(column: &str) -> Self {
        Self::new(column, AggFunc::Mean)
    }

    pub fn count(column: &str) -> Self {
        Self::new(column, AggFunc::Count)
    }

    /// Builder method to rename the output column.
    pub fn named(mut self, alias: &str) -> Self {
        self.alias = alias.to_string();
        self
    }
}

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// One sort key.
#[derive(Debug, Clone)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            descending: false,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            descending: true,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Accumulator {
    int_sum: i64,
    float_sum: f64,
    saw_float: bool,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, value: &Value, func: AggFunc, row: usize, column: &str) -> Result<(), StatsError> {
        match value {
            Value::Null => {}
            Value::Int(i) => {
                self.int_sum += i;
                self.count += 1;
            }
            Value::Float(f) => {
                self.float_sum += f;
                self.saw_float = true;
                self.count += 1;
            }
            Value::Text(_) if func == AggFunc::Count => {
                self.count += 1;
            }
            Value::Text(s) => {
                return Err(StatsError::MalformedRow {
                    row,
                    reason: format!("column '{}' is not numeric: '{}'", column, s),
                });
            }
        }
        Ok(())
    }

    fn finish(&self, func: AggFunc) -> Value {
        match func {
            AggFunc::Count => Value::Int(self.count as i64),
            AggFunc::Sum if self.saw_float => Value::Float(self.int_sum as f64 + self.float_sum),
            AggFunc::Sum => Value::Int(self.int_sum),
            AggFunc::Mean if self.count == 0 => Value::Null,
            AggFunc::Mean => {
                Value::Float((self.int_sum as f64 + self.float_sum) / self.count as f64)
            }
        }
    }
}

/// An ordered sequence of rows with a known column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from rows, collecting columns in first-seen order.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.push(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Append a row, registering any new columns.
    pub fn push(&mut self, row: Row) {
        for (column, _) in row.iter() {
            if !self.has_column(column) {
                self.columns.push(column.clone());
            }
        }
        self.rows.push(row);
    }

    fn add_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
    }

    /// Fail with `UnresolvedKey` unless every column exists.
    pub fn require_columns(&self, columns: &[&str]) -> Result<(), StatsError> {
        for column in columns {
            if !self.has_column(column) {
                return Err(StatsError::UnresolvedKey(column.to_string()));
            }
        }
        Ok(())
    }

    /// Keep rows matching the predicate.
    pub fn filter<F>(&self, predicate: F) -> Table
    where
        F: Fn(&Row) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Project onto a subset of columns.
    pub fn select(&self, columns: &[&str]) -> Result<Table, StatsError> {
        self.require_columns(columns)?;
        let rows = self
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| (c.to_string(), row.get(c).clone()))
                    .collect()
            })
            .collect();
        Ok(Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// Add (or replace) a column computed from each row.
    pub fn with_column<F>(mut self, column: &str, compute: F) -> Table
    where
        F: Fn(&Row) -> Value,
    {
        for row in &mut self.rows {
            let value = compute(row);
            row.set(column, value);
        }
        self.add_column(column);
        self
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, column: &str) -> Result<Vec<&Value>, StatsError> {
        self.require_columns(&[column])?;
        Ok(self.rows.iter().map(|r| r.get(column)).collect())
    }

    /// Append the rows of `other`, taking the union of columns.
    pub fn concat(mut self, other: Table) -> Table {
        for column in &other.columns {
            self.add_column(column);
        }
        self.rows.extend(other.rows);
        self
    }

    /// Replace nulls (and absent fields) in `column` with `default`.
    pub fn fill_missing(mut self, column: &str, default: Value) -> Table {
        for row in &mut self.rows {
            if row.get(column).is_null() {
                row.set(column, default.clone());
            }
        }
        self.add_column(column);
        self
    }

    /// Apply [`Table::fill_missing`] for several columns.
    pub fn fill_missing_with(self, defaults: &[(&str, Value)]) -> Table {
        defaults
            .iter()
            .fold(self, |table, (column, default)| {
                table.fill_missing(column, default.clone())
            })
    }

    /// Stable sort by one or more keys.
    pub fn sort_by(mut self, keys: &[SortKey]) -> Result<Table, StatsError> {
        let names: Vec<&str> = keys.iter().map(|k| k.column.as_str()).collect();
        self.require_columns(&names)?;
        self.rows.sort_by(|a, b| {
            for key in keys {
                let ord = a.get(&key.column).total_cmp(b.get(&key.column));
                let ord = if key.descending { ord.reverse() } else { ord };
                if ord != std::cmp::Ordering::Equal {
                    return ord;
                }
            }
            std::cmp::Ordering::Equal
        });
        Ok(self)
    }

    /// Group rows by `keys` and aggregate.
    ///
    /// One output row per distinct key, in ascending key order. Key columns come
    /// first, followed by each aggregation's alias.
    pub fn group_by(&self, keys: &[&str], aggregations: &[Aggregation]) -> Result<Table, StatsError> {
        self.require_columns(keys)?;
        let agg_columns: Vec<&str> = aggregations.iter().map(|a| a.column.as_str()).collect();
        self.require_columns(&agg_columns)?;

        let key_columns: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let mut groups: BTreeMap<GroupKey, Vec<Accumulator>> = BTreeMap::new();

        for (idx, row) in self.rows.iter().enumerate() {
            let accs = groups
                .entry(row.key(&key_columns))
                .or_insert_with(|| vec![Accumulator::default(); aggregations.len()]);
            for (acc, agg) in accs.iter_mut().zip(aggregations) {
                acc.add(row.get(&agg.column), agg.func, idx, &agg.column)?;
            }
        }

        let mut columns = key_columns.clone();
        columns.extend(aggregations.iter().map(|a| a.alias.clone()));

        let rows = groups
            .into_iter()
            .map(|(key, accs)| {
                let mut row: Row = key_columns.iter().cloned().zip(key.0).collect();
                for (acc, agg) in accs.iter().zip(aggregations) {
                    row.set(agg.alias.clone(), acc.finish(agg.func));
                }
                row
            })
            .collect();

        Ok(Table { columns, rows })
    }

    /// Join with `right` on equal values of `keys`.
    ///
    /// Left joins keep every left row in order; duplicate right keys fan out.
    /// Null keys never match. Right non-key columns that collide with a left
    /// column are suffixed with `_right`.
    pub fn join(&self, right: &Table, keys: &[&str], kind: JoinKind) -> Result<Table, StatsError> {
        self.require_columns(keys)?;
        right.require_columns(keys)?;

        let key_columns: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let right_columns: Vec<(String, String)> = right
            .columns
            .iter()
            .filter(|c| !key_columns.contains(c))
            .map(|c| {
                let out = if self.has_column(c) {
                    format!("{}_right", c)
                } else {
                    c.clone()
                };
                (c.clone(), out)
            })
            .collect();

        let mut index: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
        for (idx, row) in right.rows.iter().enumerate() {
            let key = row.key(&key_columns);
            if !key.has_null() {
                index.entry(key).or_default().push(idx);
            }
        }

        let mut columns = self.columns.clone();
        columns.extend(right_columns.iter().map(|(_, out)| out.clone()));

        let mut rows = Vec::with_capacity(self.rows.len());
        for left in &self.rows {
            let key = left.key(&key_columns);
            let matches = if key.has_null() { None } else { index.get(&key) };
            match matches {
                Some(indices) => {
                    for &idx in indices {
                        let mut row = left.clone();
                        for (src, out) in &right_columns {
                            row.set(out.clone(), right.rows[idx].get(src).clone());
                        }
                        rows.push(row);
                    }
                }
                None if kind == JoinKind::Left => {
                    let mut row = left.clone();
                    for (_, out) in &right_columns {
                        row.set(out.clone(), Value::Null);
                    }
                    rows.push(row);
                }
                None => {}
            }
        }

        Ok(Table { columns, rows })
    }

    /// Pivot `values` into a grid of `index` rows by `columns` keys.
    ///
    /// Rows with a null value or null column key are skipped. Missing
    /// combinations are `Null`; use [`Table::fill_missing_with`] to default them.
    pub fn pivot(
        &self,
        index: &str,
        columns: &str,
        values: &str,
        func: AggFunc,
    ) -> Result<Table, StatsError> {
        self.require_columns(&[index, columns, values])?;

        let mut cells: BTreeMap<GroupKey, BTreeMap<GroupKey, Accumulator>> = BTreeMap::new();
        let mut column_keys: BTreeSet<GroupKey> = BTreeSet::new();

        for (idx, row) in self.rows.iter().enumerate() {
            let value = row.get(values);
            let column_key = GroupKey(vec![row.get(columns).clone()]);
            if value.is_null() || column_key.has_null() {
                continue;
            }
            let row_key = GroupKey(vec![row.get(index).clone()]);
            column_keys.insert(column_key.clone());
            cells
                .entry(row_key)
                .or_default()
                .entry(column_key)
                .or_default()
                .add(value, func, idx, values)?;
        }

        let column_names: Vec<String> = column_keys.iter().map(|k| k.0[0].to_string()).collect();
        let mut out_columns = vec![index.to_string()];
        out_columns.extend(column_names.iter().cloned());

        let rows = cells
            .into_iter()
            .map(|(row_key, row_cells)| {
                let mut row = Row::new().with(index, row_key.0[0].clone());
                for (key, name) in column_keys.iter().zip(&column_names) {
                    let value = row_cells
                        .get(key)
                        .map(|acc| acc.finish(func))
                        .unwrap_or(Value::Null);
                    row.set(name.clone(), value);
                }
                row
            })
            .collect();

        Ok(Table {
            columns: out_columns,
            rows,
        })
    }
}
