//! # Ladder Board
//!
//! Challenge-ladder rankings for armwrestling weight classes, rebuilt from
//! scratch on every load by replaying head-to-head match results.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (competitors, matches, ladder keys, snapshots)
//! - **ladder**: Seeding, match ordering, replay, and recency badges
//! - **ingest**: CSV tables to typed records
//! - **fetch**: Data sources (Google Sheets, URLs, files)
//! - **sync**: Refresh scheduling
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod ladder;
pub mod models;
pub mod sync;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "30m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num * multiplier))
}
