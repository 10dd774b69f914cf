use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, LadderConfig};
use crate::sync::Refresher;

#[derive(Clone)]
pub struct AppState {
    pub ladder: Arc<LadderConfig>,
    pub refresher: Arc<Refresher>,
    pub live_poll: Duration,
    pub live_ticks: u32,
    pub cors_origin: String,
}

impl AppState {
    /// State for a server built from a validated configuration.
    pub fn from_config(config: &AppConfig, refresher: Arc<Refresher>) -> Self {
        Self {
            ladder: Arc::new(config.ladder.clone()),
            refresher,
            live_poll: config
                .refresh
                .live_poll()
                .unwrap_or(Duration::from_secs(2)),
            live_ticks: config.refresh.live_ticks,
            cors_origin: config.server.cors_origin.clone(),
        }
    }
}
