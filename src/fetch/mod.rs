//! Loading the roster and match tables.
//!
//! Tables are CSV, either exported from a Google Sheets tab, served from any
//! URL, or read from disk. Network fetches always bypass caches: every request
//! carries a fresh `t=<millis>` query parameter and `Cache-Control: no-cache`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::{LadderConfig, SourceConfig, TableSource};
use crate::ingest::{IngestError, RecordSet};

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },
}

/// Errors from loading a full record set.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),
}

/// CSV export URL of one Google Sheets tab.
pub fn sheet_csv_url(id: &str, gid: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse("https://docs.google.com/spreadsheets/d/")
        .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidUrl("cannot be a base".to_string()))?
        .pop_if_empty()
        .extend([id, "gviz", "tq"]);
    url.query_pairs_mut()
        .append_pair("tqx", "out:csv")
        .append_pair("gid", gid);
    Ok(url)
}

/// Add a `t=<millis>` parameter so no intermediate cache can serve stale data.
pub fn with_cache_bust(url: &Url, millis: i64) -> Url {
    let mut busted = url.clone();
    busted
        .query_pairs_mut()
        .append_pair("t", &millis.to_string());
    busted
}

/// Configuration for the table fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Maximum table size to accept
    pub max_content_size: usize,

    /// User agent string
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_content_size: 10 * 1024 * 1024, // 10MB
            user_agent: format!("ladder-board/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&SourceConfig> for FetcherConfig {
    fn from(config: &SourceConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_seconds),
            ..Default::default()
        }
    }
}

/// Fetches CSV tables over HTTP or from disk.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("ladder-board")),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a fetcher with default configuration.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetcherConfig::default())
    }

    /// Read one table as text.
    pub async fn fetch_table(&self, source: &TableSource) -> Result<String, FetchError> {
        match source {
            TableSource::Sheet { id, gid } => self.fetch_url(&sheet_csv_url(id, gid)?).await,
            TableSource::Url { url } => {
                let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
                self.fetch_url(&url).await
            }
            TableSource::File { path } => {
                debug!("Reading table from {:?}", path);
                Ok(tokio::fs::read_to_string(path).await?)
            }
        }
    }

    async fn fetch_url(&self, url: &Url) -> Result<String, FetchError> {
        let url = with_cache_bust(url, Utc::now().timestamp_millis());
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

        Ok(String::from_utf8_lossy(&content).into_owned())
    }
}

/// Anything that can produce a fresh `RecordSet`.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Source name for logs.
    fn name(&self) -> &str;

    /// Load both tables and normalize them.
    async fn load(&self) -> Result<RecordSet, SourceError>;
}

/// The roster and match tables named in the configuration.
pub struct TableRecordSource {
    fetcher: Fetcher,
    source: SourceConfig,
    ladder: LadderConfig,
}

impl TableRecordSource {
    pub fn new(fetcher: Fetcher, source: SourceConfig, ladder: LadderConfig) -> Self {
        Self {
            fetcher,
            source,
            ladder,
        }
    }

    pub fn from_config(source: &SourceConfig, ladder: &LadderConfig) -> Result<Self, FetchError> {
        let fetcher = Fetcher::new(FetcherConfig::from(source))?;
        Ok(Self::new(fetcher, source.clone(), ladder.clone()))
    }
}

#[async_trait]
impl RecordSource for TableRecordSource {
    fn name(&self) -> &str {
        "tables"
    }

    async fn load(&self) -> Result<RecordSet, SourceError> {
        let (players, matches) = tokio::try_join!(
            self.fetcher.fetch_table(&self.source.players),
            self.fetcher.fetch_table(&self.source.matches),
        )?;
        let records = RecordSet::from_csv(&players, &matches, &self.ladder)?;
        info!(
            "Loaded {} competitors and {} matches (revision {})",
            records.competitors.len(),
            records.matches.len(),
            records.revision
        );
        Ok(records)
    }
}

/// A fixed pair of CSV tables held in memory.
pub struct StaticSource {
    players_csv: String,
    matches_csv: String,
    ladder: LadderConfig,
}

impl StaticSource {
    pub fn new(players_csv: impl Into<String>, matches_csv: impl Into<String>, ladder: LadderConfig) -> Self {
        Self {
            players_csv: players_csv.into(),
            matches_csv: matches_csv.into(),
            ladder,
        }
    }

    pub fn shared(self) -> Arc<dyn RecordSource> {
        Arc::new(self)
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn load(&self) -> Result<RecordSet, SourceError> {
        Ok(RecordSet::from_csv(&self.players_csv, &self.matches_csv, &self.ladder)?)
    }
}
