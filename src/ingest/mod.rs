//! Record normalization at the data-source boundary.
//!
//! Raw CSV tables go in; typed `Competitor` and `MatchRecord` values come out,
//! together with a report of everything that was dropped or degraded. The
//! ladder engine never sees raw rows.

pub mod normalize;
pub mod table;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::LadderConfig;
use crate::models::{Competitor, CompetitorId, MatchRecord, Revision};

pub use normalize::{competitor_from_row, match_from_row, normalize_competitors, normalize_matches};
pub use table::{parse_csv, RawRow};

/// Errors that can occur while reading a table.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// What happened to the rows of one load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub competitors_read: usize,
    pub inactive_competitors: usize,
    /// Competitors whose weight class matches no configured group
    pub unplaced_competitors: Vec<CompetitorId>,
    pub matches_read: usize,
    /// Match rows dropped because their arm could not be read
    pub matches_without_arm: usize,
    /// Match rows kept with an unreadable date; they replay first
    pub undated_matches: usize,
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Competitors:          {}", self.competitors_read)?;
        writeln!(f, "  inactive:           {}", self.inactive_competitors)?;
        writeln!(f, "  unplaced:           {}", self.unplaced_competitors.len())?;
        writeln!(f, "Matches:              {}", self.matches_read)?;
        writeln!(f, "  dropped (no arm):   {}", self.matches_without_arm)?;
        write!(f, "  undated:            {}", self.undated_matches)
    }
}

/// One immutable load of both tables.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSet {
    pub competitors: Vec<Competitor>,
    pub matches: Vec<MatchRecord>,
    pub report: IngestReport,
    pub revision: Revision,
    pub loaded_at: DateTime<Utc>,
}

impl RecordSet {
    /// Wrap already-typed records, computing their revision.
    pub fn new(competitors: Vec<Competitor>, matches: Vec<MatchRecord>, report: IngestReport) -> Self {
        let revision = revision_of(&competitors, &matches);
        Self {
            competitors,
            matches,
            report,
            revision,
            loaded_at: Utc::now(),
        }
    }

    /// Parse and normalize the roster and match tables.
    pub fn from_csv(players_csv: &str, matches_csv: &str, config: &LadderConfig) -> Result<Self, IngestError> {
        let mut report = IngestReport::default();
        let competitors = normalize_competitors(&parse_csv(players_csv)?, config, &mut report);
        let matches = normalize_matches(&parse_csv(matches_csv)?, &mut report);
        Ok(Self::new(competitors, matches, report))
    }
}

fn revision_of(competitors: &[Competitor], matches: &[MatchRecord]) -> Revision {
    let fields = competitors
        .iter()
        .map(|c| serde_json::to_string(c).unwrap_or_default())
        .chain(std::iter::once("--".to_string()))
        .chain(matches.iter().map(|m| serde_json::to_string(m).unwrap_or_default()));
    Revision::generate(fields)
}
