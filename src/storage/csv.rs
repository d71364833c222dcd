//! CSV sheet exports.
//!
//! The header row names the columns; every cell is inferred as an integer,
//! float, text or (when empty) null.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use super::StorageError;
use crate::table::{Row, Table, Value};

/// Read a CSV file into a table.
pub fn read_table(path: &Path) -> Result<Table, StorageError> {
    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }
    parse_table(File::open(path)?)
}

/// Parse CSV data into a table.
///
/// Short rows are padded with nulls; cells beyond the header are dropped.
pub fn parse_table<R: Read>(data: R) -> Result<Table, StorageError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(data);
    let headers = reader.headers()?.clone();
    let columns: Vec<&str> = headers.iter().collect();

    let mut table = Table::new(&columns);
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let row: Row = columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let value = record.get(i).map(Value::parse_cell).unwrap_or_default();
                (column.to_string(), value)
            })
            .collect();
        table.push(row);
    }
    Ok(table)
}
