//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::models::{Arm, LadderKey};
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

/// Weight groups, recency window and board layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Weight groups from lightest to heaviest; the last one is unbounded
    #[serde(default = "default_weight_groups")]
    pub weight_groups: Vec<String>,

    /// Base classes treated as the lightest weight group
    #[serde(default = "default_lightest_synonyms")]
    pub lightest_synonyms: Vec<String>,

    /// How far back events count as recent, in days
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Whether recency badges and rank deltas are shown at all
    #[serde(default = "default_show_badges")]
    pub show_badges: bool,

    /// Rows shown for the unbounded group's ladders
    #[serde(default = "default_open_limit")]
    pub open_limit: usize,

    /// Rows shown for every other ladder
    #[serde(default = "default_class_limit")]
    pub class_limit: usize,
}

fn default_weight_groups() -> Vec<String> {
    ["u60kg", "u75kg", "u85kg", "Open"]
        .iter()
        .map(|g| g.to_string())
        .collect()
}

fn default_lightest_synonyms() -> Vec<String> {
    vec!["women".to_string()]
}

fn default_window_days() -> u32 {
    30
}

fn default_show_badges() -> bool {
    true
}

fn default_open_limit() -> usize {
    15
}

fn default_class_limit() -> usize {
    10
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            weight_groups: default_weight_groups(),
            lightest_synonyms: default_lightest_synonyms(),
            window_days: default_window_days(),
            show_badges: default_show_badges(),
            open_limit: default_open_limit(),
            class_limit: default_class_limit(),
        }
    }
}

impl LadderConfig {
    /// Every ladder in display order: the unbounded group first, then the
    /// remaining groups heaviest to lightest, Right before Left within a group.
    pub fn ladder_keys(&self) -> Vec<LadderKey> {
        self.weight_groups
            .iter()
            .rev()
            .flat_map(|g| Arm::ALL.iter().map(move |arm| LadderKey::new(g.clone(), *arm)))
            .collect()
    }

    /// The unbounded group every competitor cascades into.
    pub fn open_group(&self) -> Option<&str> {
        self.weight_groups.last().map(String::as_str)
    }

    /// How many rows of a ladder the board shows.
    pub fn display_limit(&self, key: &LadderKey) -> usize {
        if Some(key.group.as_str()) == self.open_group() {
            self.open_limit
        } else {
            self.class_limit
        }
    }
}

/// Where one table of records comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TableSource {
    /// A Google Sheets tab, exported as CSV
    Sheet { id: String, gid: String },
    /// Any URL serving CSV
    Url { url: String },
    /// A CSV file on disk
    File { path: PathBuf },
}

/// Data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_players_source")]
    pub players: TableSource,

    #[serde(default = "default_matches_source")]
    pub matches: TableSource,
}

fn default_players_source() -> TableSource {
    TableSource::File {
        path: PathBuf::from("./data/players.csv"),
    }
}

fn default_matches_source() -> TableSource {
    TableSource::File {
        path: PathBuf::from("./data/matches.csv"),
    }
}

fn default_timeout() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            players: default_players_source(),
            matches: default_matches_source(),
        }
    }
}

/// Reload cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Background reload interval (e.g. "60s", "5m")
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Poll interval during a live burst
    #[serde(default = "default_live_poll")]
    pub live_poll: String,

    /// Number of polls in a live burst
    #[serde(default = "default_live_ticks")]
    pub live_ticks: u32,
}

fn default_interval() -> String {
    "60s".to_string()
}

fn default_live_poll() -> String {
    "2s".to_string()
}

fn default_live_ticks() -> u32 {
    30
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            live_poll: default_live_poll(),
            live_ticks: default_live_ticks(),
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.interval).ok_or_else(|| {
            ConfigError::ValidationError(format!("Invalid refresh interval: {}", self.interval))
        })
    }

    pub fn live_poll(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.live_poll).ok_or_else(|| {
            ConfigError::ValidationError(format!("Invalid live poll interval: {}", self.live_poll))
        })
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
    pub ladder: LadderConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

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
            ladder: LadderConfig::default(),
            source: SourceConfig::default(),
            refresh: RefreshConfig::default(),
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

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ladder.weight_groups.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one weight group is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for group in &self.ladder.weight_groups {
            if group.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Weight group names must not be blank".to_string(),
                ));
            }
            if !seen.insert(group.to_lowercase()) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate weight group: {}",
                    group
                )));
            }
        }

        if self.source.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Source timeout must be greater than 0".to_string(),
            ));
        }

        self.refresh.interval()?;
        self.refresh.live_poll()?;
        if self.refresh.live_ticks == 0 {
            return Err(ConfigError::ValidationError(
                "Live ticks must be greater than 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
