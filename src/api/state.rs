use std::sync::Arc;

use crate::config::{AppConfig, SourceKind};
use crate::fetch::{FetchError, SheetFetcher};
use crate::ingest::{DataLoader, RowSource};
use crate::storage::LocalSource;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub loader: Arc<DataLoader<dyn RowSource>>,
}

impl AppState {
    pub fn new(config: AppConfig, source: Arc<dyn RowSource>) -> Self {
        let loader = DataLoader::new(source, config.stats.clone());
        Self {
            config: Arc::new(config),
            loader: Arc::new(loader),
        }
    }

    /// State backed by the source named in the configuration.
    pub fn from_config(config: AppConfig) -> Result<Self, FetchError> {
        let source: Arc<dyn RowSource> = match config.source.kind {
            SourceKind::Local => Arc::new(LocalSource::from_config(&config.source)),
            SourceKind::Sheets => Arc::new(SheetFetcher::from_config(&config.source)?),
        };
        Ok(Self::new(config, source))
    }
}
