//! JSONL (JSON Lines) sheet exports.
//!
//! Each line is one JSON object holding one sheet row. Nested arrays and
//! objects (such as match rosters) are kept as their JSON text.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::StorageError;
use crate::table::{Row, Table, Value};

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all entities from the file.
    ///
    /// Lines that fail to parse are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Err(StorageError::PathNotFound(self.path.clone()));
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();
        let mut line_num = 0;

        for line in reader.lines() {
            line_num += 1;
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        line_num, self.path, e
                    );
                }
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}

/// Reader for untyped sheet rows.
pub type RowReader = JsonlReader<serde_json::Map<String, serde_json::Value>>;

impl RowReader {
    /// Read the file as sheet rows.
    pub fn read_table(&self) -> Result<Table, StorageError> {
        let objects = self.read_all()?;
        Ok(Table::from_rows(
            objects
                .into_iter()
                .map(|object| {
                    object
                        .into_iter()
                        .map(|(column, value)| (column, cell(value)))
                        .collect::<Row>()
                })
                .collect(),
        ))
    }
}

/// Convert a JSON value into a cell.
fn cell(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Int(i64::from(b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::from).unwrap_or_default(),
        },
        serde_json::Value::String(s) => Value::parse_cell(&s),
        nested => Value::Text(nested.to_string()),
    }
}
