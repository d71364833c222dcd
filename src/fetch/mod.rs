//! Spreadsheet CSV exports over HTTP.
//!
//! Fetches published sheet exports and parses them into tables. Parsed
//! tables are kept in a [`QueryCache`] so repeated requests within the TTL
//! do not hit the network.

mod cache;

pub use cache::QueryCache;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::config::SourceConfig;
use crate::ingest::{IngestError, RowSource, Sheet};
use crate::storage::{self, StorageError};
use crate::table::Table;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] StorageError),
}

/// Configuration for the sheet fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// How long fetched sheets are reused
    pub cache_ttl: Duration,

    /// Maximum export size to accept (default 20MB)
    pub max_content_size: usize,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(600),
            max_content_size: 20 * 1024 * 1024,
            timeout: Duration::from_secs(30),
            user_agent: concat!("match-stats/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Export URLs for each sheet.
#[derive(Debug, Clone)]
pub struct SheetUrls {
    pub matches: Url,
    pub players: Url,
    pub roster: Option<Url>,
}

impl SheetUrls {
    /// Parse the URLs from source configuration.
    pub fn from_config(config: &SourceConfig) -> Result<Self, FetchError> {
        let parse = |raw: &Option<String>, name: &str| -> Result<Option<Url>, FetchError> {
            raw.as_deref()
                .map(|u| Url::parse(u).map_err(|e| FetchError::InvalidUrl(format!("{} ({}): {}", name, u, e))))
                .transpose()
        };
        Ok(Self {
            matches: parse(&config.matches_url, "matches_url")?
                .ok_or_else(|| FetchError::InvalidUrl("matches_url is not set".to_string()))?,
            players: parse(&config.players_url, "players_url")?
                .ok_or_else(|| FetchError::InvalidUrl("players_url is not set".to_string()))?,
            roster: parse(&config.roster_url, "roster_url")?,
        })
    }

    fn for_sheet(&self, sheet: Sheet) -> Option<&Url> {
        match sheet {
            Sheet::Matches => Some(&self.matches),
            Sheet::Players => Some(&self.players),
            Sheet::Roster => self.roster.as_ref(),
        }
    }
}

/// HTTP fetcher for sheet exports with an in-memory cache.
pub struct SheetFetcher {
    client: Client,
    config: FetcherConfig,
    urls: SheetUrls,
    cache: Mutex<QueryCache>,
}

impl SheetFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(urls: SheetUrls, config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("match-stats")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            cache: Mutex::new(QueryCache::new(config.cache_ttl)),
            config,
            urls,
        })
    }

    /// Builder method to replace the cache, e.g. one restored from a snapshot.
    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = Mutex::new(cache);
        self
    }

    /// Create a fetcher from source configuration.
    pub fn from_config(source: &SourceConfig) -> Result<Self, FetchError> {
        let config = FetcherConfig {
            cache_ttl: source.cache_ttl().unwrap_or(Duration::from_secs(600)),
            timeout: Duration::from_secs(source.timeout_seconds),
            ..FetcherConfig::default()
        };
        Self::new(SheetUrls::from_config(source)?, config)
    }

    /// Fetch a URL, using the cache if the entry is fresh.
    pub async fn fetch(&self, url: &Url) -> Result<Table, FetchError> {
        {
            let cache = self.cache.lock().await;
            if let Some(table) = cache.get(url.as_str(), Utc::now()) {
                info!("Serving {} from cache", url);
                return Ok(table.clone());
            }
        }
        self.fetch_fresh(url).await
    }

    /// Force fetch from network, replacing any cached entry.
    pub async fn fetch_fresh(&self, url: &Url) -> Result<Table, FetchError> {
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content = response.bytes().await?;
        if content.len() > self.config.max_content_size {
            return Err(FetchError::ContentTooLarge {
                size: content.len(),
                max_size: self.config.max_content_size,
            });
        }

        let table = storage::csv::parse_table(&content[..])?;
        debug!("Parsed {} rows from {}", table.len(), url);

        self.cache
            .lock()
            .await
            .insert(url.as_str(), table.clone(), Utc::now());
        Ok(table)
    }

    /// Seed the cache, e.g. from a previous run's snapshot.
    pub async fn prime(&self, url: &Url, table: Table) {
        self.cache.lock().await.insert(url.as_str(), table, Utc::now());
    }
}

#[async_trait]
impl RowSource for SheetFetcher {
    async fn load(&self, sheet: Sheet) -> Result<Table, IngestError> {
        match self.urls.for_sheet(sheet) {
            Some(url) => Ok(self.fetch(url).await?),
            None => {
                debug!("No URL configured for {} sheet", sheet);
                Ok(Table::default())
            }
        }
    }
}
