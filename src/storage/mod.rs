//! Local sheet exports.
//!
//! Reads the match, player and roster sheets from a data directory:
//! - CSV exports (`.csv`)
//! - JSON-lines exports (`.jsonl`)
//!
//! The current and legacy match sheets are concatenated, current first.

pub mod csv;
pub mod jsonl;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::ingest::{IngestError, RowSource, Sheet};
use crate::table::Table;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Read one export, choosing the reader by extension.
pub fn read_file(path: &Path) -> Result<Table, StorageError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") => jsonl::RowReader::new(path.to_path_buf()).read_table(),
        _ => csv::read_table(path),
    }
}

/// Sheets stored as files under a data directory.
#[derive(Debug, Clone)]
pub struct LocalSource {
    pub data_dir: PathBuf,
    pub matches: String,
    pub matches_legacy: Option<String>,
    pub players: String,
    pub roster: String,
}

impl LocalSource {
    pub fn new(data_dir: PathBuf) -> Self {
        let defaults = SourceConfig::default();
        Self {
            data_dir,
            matches: defaults.matches,
            matches_legacy: None,
            players: defaults.players,
            roster: defaults.roster,
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            matches: config.matches.clone(),
            matches_legacy: config.matches_legacy.clone(),
            players: config.players.clone(),
            roster: config.roster.clone(),
        }
    }

    /// Builder method to set the legacy match sheet.
    pub fn with_legacy_matches(mut self, pattern: &str) -> Self {
        self.matches_legacy = Some(pattern.to_string());
        self
    }

    /// Files matching a sheet pattern, sorted by path.
    pub fn resolve(&self, pattern: &str) -> Result<Vec<PathBuf>, StorageError> {
        let full = self.data_dir.join(pattern);
        let full = full
            .to_str()
            .ok_or_else(|| StorageError::InvalidPath(full.display().to_string()))?;

        let mut paths: Vec<PathBuf> = glob::glob(full)
            .map_err(|e| StorageError::InvalidPath(format!("{}: {}", full, e)))?
            .filter_map(Result::ok)
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn read_pattern(&self, pattern: &str) -> Result<Table, StorageError> {
        let paths = self.resolve(pattern)?;
        if paths.is_empty() {
            return Err(StorageError::PathNotFound(self.data_dir.join(pattern)));
        }

        let mut table = Table::default();
        for path in paths {
            let part = read_file(&path)?;
            debug!("Read {} rows from {:?}", part.len(), path);
            table = table.concat(part);
        }
        Ok(table)
    }

    /// Read a sheet. A missing roster yields an empty table.
    pub fn read_sheet(&self, sheet: Sheet) -> Result<Table, StorageError> {
        let table = match sheet {
            Sheet::Matches => {
                let current = self.read_pattern(&self.matches)?;
                match &self.matches_legacy {
                    Some(legacy) => current.concat(self.read_pattern(legacy)?),
                    None => current,
                }
            }
            Sheet::Players => self.read_pattern(&self.players)?,
            Sheet::Roster => match self.read_pattern(&self.roster) {
                Err(StorageError::PathNotFound(path)) => {
                    debug!("No roster sheet at {:?}", path);
                    Table::default()
                }
                other => other?,
            },
        };
        info!("Loaded {} {} rows from {:?}", table.len(), sheet, self.data_dir);
        Ok(table)
    }
}

#[async_trait]
impl RowSource for LocalSource {
    async fn load(&self, sheet: Sheet) -> Result<Table, IngestError> {
        Ok(self.read_sheet(sheet)?)
    }
}
