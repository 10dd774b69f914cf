//! Refresh scheduling.
//!
//! The `Refresher` reloads the roster and match tables from a `RecordSource`
//! and keeps the most recent load. Ladders are not stored; callers recompute
//! them from the current `RecordSet`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::fetch::{RecordSource, SourceError};
use crate::ingest::RecordSet;
use crate::models::Revision;

/// Errors that can occur during a refresh.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Refresh cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// State of the most recent refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshState {
    pub status: RefreshStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Revision of the records currently held
    pub revision: Option<Revision>,
    /// Whether the last successful load differed from the one before it
    pub changed: bool,
    /// Polls left in a running live burst
    pub live_ticks_remaining: u32,
    pub last_error: Option<String>,
}

/// Outcome of one reload.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    pub revision: Revision,
    pub changed: bool,
    pub competitors: usize,
    pub matches: usize,
}

/// Reloads records on demand or on a schedule.
pub struct Refresher {
    source: Arc<dyn RecordSource>,
    records: Arc<RwLock<Option<Arc<RecordSet>>>>,
    state: Arc<RwLock<RefreshState>>,
    cancel_token: Arc<RwLock<bool>>,
}

impl Refresher {
    /// Create a new refresher. Nothing is loaded until the first refresh.
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self {
            source,
            records: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(RefreshState::default())),
            cancel_token: Arc::new(RwLock::new(false)),
        }
    }

    /// The most recent successful load, if any.
    pub async fn records(&self) -> Option<Arc<RecordSet>> {
        self.records.read().await.clone()
    }

    /// Get current refresh state.
    pub async fn state(&self) -> RefreshState {
        self.state.read().await.clone()
    }

    /// Check if a refresh is currently running.
    pub async fn is_running(&self) -> bool {
        self.state.read().await.status == RefreshStatus::Running
    }

    /// Claim the live burst slot for `ticks` polls.
    ///
    /// Returns `false` if a burst is already running. The check and the claim
    /// happen under one write lock, so concurrent callers cannot both succeed.
    pub async fn try_begin_live(&self, ticks: u32) -> bool {
        let mut state = self.state.write().await;
        if state.live_ticks_remaining > 0 {
            return false;
        }
        state.live_ticks_remaining = ticks;
        true
    }

    /// Stop any periodic or live loop at its next tick.
    pub async fn cancel(&self) {
        *self.cancel_token.write().await = true;
    }

    /// Reload both tables once and swap in the new records.
    ///
    /// On failure the previously loaded records stay in place.
    pub async fn refresh_once(&self) -> Result<RefreshResult, RefreshError> {
        {
            let mut state = self.state.write().await;
            state.status = RefreshStatus::Running;
            state.started_at = Some(Utc::now());
        }

        match self.source.load().await {
            Ok(records) => {
                let previous = self.records.read().await.as_ref().map(|r| r.revision.clone());
                let changed = previous.as_ref() != Some(&records.revision);
                let result = RefreshResult {
                    revision: records.revision.clone(),
                    changed,
                    competitors: records.competitors.len(),
                    matches: records.matches.len(),
                };

                *self.records.write().await = Some(Arc::new(records));

                let mut state = self.state.write().await;
                state.status = RefreshStatus::Completed;
                state.completed_at = Some(Utc::now());
                state.revision = Some(result.revision.clone());
                state.changed = changed;
                state.last_error = None;

                if changed {
                    info!(
                        "Records updated from {}: {} competitors, {} matches (revision {})",
                        self.source.name(),
                        result.competitors,
                        result.matches,
                        result.revision
                    );
                }
                Ok(result)
            }
            Err(e) => {
                error!("Refresh from {} failed: {}", self.source.name(), e);
                let mut state = self.state.write().await;
                state.status = RefreshStatus::Failed;
                state.completed_at = Some(Utc::now());
                state.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Reload on a fixed interval until cancelled.
    pub async fn run_periodic(self: Arc<Self>, every: Duration) {
        let mut ticker = interval(every);

        info!("Starting periodic refresh every {:?}", every);

        loop {
            ticker.tick().await;

            if *self.cancel_token.read().await {
                info!("Periodic refresh stopped");
                break;
            }

            // Failures are logged and recorded in state; keep polling
            let _ = self.refresh_once().await;
        }
    }

    /// Poll rapidly for a bounded number of ticks, e.g. while matches are
    /// being entered at an event.
    pub async fn run_live(self: Arc<Self>, poll: Duration, ticks: u32) -> Result<u32, RefreshError> {
        let mut ticker = interval(poll);
        let mut done = 0;

        info!("Starting live refresh: {} polls every {:?}", ticks, poll);
        self.state.write().await.live_ticks_remaining = ticks;

        while done < ticks {
            ticker.tick().await;

            if *self.cancel_token.read().await {
                warn!("Live refresh cancelled after {} polls", done);
                self.state.write().await.live_ticks_remaining = 0;
                return Err(RefreshError::Cancelled);
            }

            let _ = self.refresh_once().await;
            done += 1;
            self.state.write().await.live_ticks_remaining = ticks - done;
        }

        info!("Live refresh finished after {} polls", done);
        Ok(done)
    }

    /// Clear a previous cancellation so loops can be started again.
    pub async fn reset_cancel(&self) {
        *self.cancel_token.write().await = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LadderConfig;
    use crate::fetch::{FetchError, StaticSource};
    use async_trait::async_trait;

    const PLAYERS: &str = "id,name,weight class\na,A,Open\nb,B,Open\n";
    const MATCHES: &str = "date,winner id,loser id,arm\n2025-08-22,b,a,L\n";

    struct FailingSource;

    #[async_trait]
    impl RecordSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn load(&self) -> Result<RecordSet, SourceError> {
            Err(SourceError::Fetch(FetchError::HttpStatus {
                status: 503,
                message: "Service Unavailable".to_string(),
            }))
        }
    }

    fn refresher() -> Refresher {
        Refresher::new(StaticSource::new(PLAYERS, MATCHES, LadderConfig::default()).shared())
    }

    #[tokio::test]
    async fn test_nothing_loaded_initially() {
        let r = refresher();
        assert!(r.records().await.is_none());
        assert_eq!(r.state().await.status, RefreshStatus::Idle);
    }

    #[tokio::test]
    async fn test_refresh_once_loads_records() {
        let r = refresher();
        let result = r.refresh_once().await.unwrap();

        assert!(result.changed);
        assert_eq!(result.competitors, 2);
        assert_eq!(result.matches, 1);

        let state = r.state().await;
        assert_eq!(state.status, RefreshStatus::Completed);
        assert_eq!(state.revision, Some(result.revision));
        assert!(r.records().await.is_some());
    }

    #[tokio::test]
    async fn test_second_identical_load_is_unchanged() {
        let r = refresher();
        r.refresh_once().await.unwrap();
        let second = r.refresh_once().await.unwrap();

        assert!(!second.changed);
        assert!(!r.state().await.changed);
    }

    #[tokio::test]
    async fn test_failed_refresh_records_error() {
        let r = Refresher::new(Arc::new(FailingSource));
        let result = r.refresh_once().await;

        assert!(result.is_err());
        let state = r.state().await;
        assert_eq!(state.status, RefreshStatus::Failed);
        assert!(state.last_error.unwrap().contains("503"));
        assert!(r.records().await.is_none());
    }

    #[tokio::test]
    async fn test_live_burst_runs_all_ticks() {
        let r = Arc::new(refresher());
        let polls = r.clone().run_live(Duration::from_millis(1), 3).await.unwrap();

        assert_eq!(polls, 3);
        assert_eq!(r.state().await.live_ticks_remaining, 0);
        assert!(r.records().await.is_some());
    }

    #[tokio::test]
    async fn test_live_slot_claimed_once() {
        let r = Arc::new(refresher());

        assert!(r.try_begin_live(3).await);
        assert!(!r.try_begin_live(3).await);
        assert_eq!(r.state().await.live_ticks_remaining, 3);

        r.clone().run_live(Duration::from_millis(1), 3).await.unwrap();
        assert!(r.try_begin_live(1).await);
    }

    #[tokio::test]
    async fn test_cancelled_live_burst() {
        let r = Arc::new(refresher());
        r.cancel().await;

        let result = r.clone().run_live(Duration::from_millis(1), 5).await;
        assert!(matches!(result, Err(RefreshError::Cancelled)));

        r.reset_cancel().await;
        assert_eq!(r.clone().run_live(Duration::from_millis(1), 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_periodic_stops_when_cancelled() {
        let r = Arc::new(refresher());
        r.cancel().await;
        // Returns on the first tick instead of looping forever
        r.clone().run_periodic(Duration::from_millis(1)).await;
        assert!(r.records().await.is_none());
    }
}
