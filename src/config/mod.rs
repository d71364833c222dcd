//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::calculate::{BlueLabelSource, RosterMatchConfig};
use crate::parse_duration;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Where sheet rows come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// CSV / JSONL exports under `data_dir`
    #[default]
    Local,

    /// Published spreadsheet CSV export URLs
    Sheets,
}

/// Data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Current match sheet (file name or glob under `data_dir`)
    #[serde(default = "default_matches")]
    pub matches: String,

    /// Older match sheet concatenated before the current one
    #[serde(default)]
    pub matches_legacy: Option<String>,

    #[serde(default = "default_players")]
    pub players: String,

    #[serde(default = "default_roster")]
    pub roster: String,

    /// CSV export URLs when `kind = "sheets"`
    #[serde(default)]
    pub matches_url: Option<String>,

    #[serde(default)]
    pub players_url: Option<String>,

    #[serde(default)]
    pub roster_url: Option<String>,

    /// How long fetched sheets are reused, e.g. "10m"
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_matches() -> String {
    "matches.csv".to_string()
}

fn default_players() -> String {
    "players.csv".to_string()
}

fn default_roster() -> String {
    "roster.csv".to_string()
}

fn default_cache_ttl() -> String {
    "10m".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            data_dir: default_data_dir(),
            matches: default_matches(),
            matches_legacy: None,
            players: default_players(),
            roster: default_roster(),
            matches_url: None,
            players_url: None,
            roster_url: None,
            cache_ttl: default_cache_ttl(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl SourceConfig {
    /// Parsed cache TTL.
    pub fn cache_ttl(&self) -> Option<Duration> {
        parse_duration(&self.cache_ttl)
    }
}

/// Statistics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Columns coerced to integers; missing values become 0
    #[serde(default = "default_integer_columns")]
    pub integer_columns: Vec<String>,

    /// Columns coerced to floats; missing values become 0.0
    #[serde(default = "default_float_columns")]
    pub float_columns: Vec<String>,

    /// Players dropped before any aggregation (Riot IDs)
    #[serde(default)]
    pub retired_players: Vec<String>,

    /// Team whose perspective win/loss and pistol rounds are recorded from
    #[serde(default)]
    pub tracked_team: Option<String>,

    #[serde(default = "default_roster_threshold")]
    pub roster_threshold: f64,

    #[serde(default)]
    pub blue_label_source: BlueLabelSource,
}

fn default_integer_columns() -> Vec<String> {
    [
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
        "rounds",
        "pistol_wins",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

fn default_float_columns() -> Vec<String> {
    vec!["acs".to_string(), "game_length".to_string()]
}

fn default_roster_threshold() -> f64 {
    0.8
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            integer_columns: default_integer_columns(),
            float_columns: default_float_columns(),
            retired_players: Vec::new(),
            tracked_team: None,
            roster_threshold: default_roster_threshold(),
            blue_label_source: BlueLabelSource::default(),
        }
    }
}

impl StatsConfig {
    /// Settings for the roster matcher.
    pub fn roster_match(&self) -> RosterMatchConfig {
        RosterMatchConfig {
            threshold: self.roster_threshold,
            blue_label: self.blue_label_source,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub stats: StatsConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            source: SourceConfig::default(),
            stats: StatsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.stats.roster_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "Roster threshold must be in (0, 1], got {}",
                threshold
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.source.cache_ttl().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "Invalid cache TTL '{}'",
                self.source.cache_ttl
            )));
        }

        if self.source.kind == SourceKind::Sheets
            && (self.source.matches_url.is_none() || self.source.players_url.is_none())
        {
            return Err(ConfigError::ValidationError(
                "Sheets source needs matches_url and players_url".to_string(),
            ));
        }

        if self.source.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Source timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.source.data_dir, PathBuf::from("./data"));
        assert_eq!(config.source.kind, SourceKind::Local);
        assert_eq!(config.stats.roster_threshold, 0.8);
        assert_eq!(config.stats.blue_label_source, BlueLabelSource::OwnRoster);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.source.cache_ttl(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.log_level, "info");
        assert!(config.stats.integer_columns.contains(&"kills".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            log_level = "debug"

            [source]
            kind = "sheets"
            matches_url = "https://docs.example.com/matches.csv"
            players_url = "https://docs.example.com/players.csv"
            cache_ttl = "5m"

            [stats]
            retired_players = ["Old#NA1"]
            tracked_team = "Alpha"
            roster_threshold = 0.6
            blue_label_source = "red_roster"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.kind, SourceKind::Sheets);
        assert_eq!(config.source.cache_ttl(), Some(Duration::from_secs(300)));
        assert_eq!(config.stats.tracked_team.as_deref(), Some("Alpha"));
        assert_eq!(config.stats.roster_match().blue_label, BlueLabelSource::RedRoster);
        assert_eq!(config.stats.roster_match().threshold, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_threshold() {
        let mut config = AppConfig::default();
        config.stats.roster_threshold = 0.0;
        assert!(config.validate().is_err());

        config.stats.roster_threshold = 1.5;
        assert!(config.validate().is_err());

        config.stats.roster_threshold = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_sheets_need_urls() {
        let mut config = AppConfig::default();
        config.source.kind = SourceKind::Sheets;
        config.source.matches_url = Some("https://docs.example.com/m.csv".into());
        assert!(config.validate().is_err());

        config.source.players_url = Some("https://docs.example.com/p.csv".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_ttl() {
        let mut config = AppConfig::default();
        config.source.cache_ttl = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9000").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.source.data_dir, parsed.source.data_dir);
        assert_eq!(config.stats.integer_columns, parsed.stats.integer_columns);
    }
}
