//! Head-to-head match results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Arm, CompetitorId};

/// One match row, already normalized from the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Arm the match was pulled with; `None` keeps the record out of every replay
    pub arm: Option<Arm>,

    pub winner: CompetitorId,
    pub loser: CompetitorId,

    /// Parsed date and time; `None` when the row's date could not be read
    pub timestamp: Option<DateTime<Utc>>,

    /// Explicit ordering hint among matches at the same instant; fractions allowed
    pub sequence: Option<f64>,

    /// Weight class label on the row. Informational only: the arm alone decides
    /// which ladders a match is replayed against.
    pub weight_class: String,

    /// Position of the row in the source table
    pub row_index: usize,

    /// Set when the row's badge flag is present and false
    pub badge_suppressed: bool,
}

impl MatchRecord {
    pub fn new(winner: impl Into<CompetitorId>, loser: impl Into<CompetitorId>, arm: Arm) -> Self {
        Self {
            arm: Some(arm),
            winner: winner.into(),
            loser: loser.into(),
            timestamp: None,
            sequence: None,
            weight_class: String::new(),
            row_index: 0,
            badge_suppressed: false,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_sequence(mut self, sequence: f64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_row_index(mut self, row_index: usize) -> Self {
        self.row_index = row_index;
        self
    }

    pub fn with_weight_class(mut self, weight_class: impl Into<String>) -> Self {
        self.weight_class = weight_class.into();
        self
    }

    pub fn suppress_badges(mut self) -> Self {
        self.badge_suppressed = true;
        self
    }

    /// Milliseconds since the Unix epoch; unreadable timestamps count as 0.
    pub fn epoch_millis(&self) -> i64 {
        self.timestamp.map(|t| t.timestamp_millis()).unwrap_or(0)
    }

    /// The instant events from this match are recorded at.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_missing_timestamp_counts_as_epoch() {
        let m = MatchRecord::new("a", "b", Arm::Left);
        assert_eq!(m.epoch_millis(), 0);
        assert_eq!(m.occurred_at(), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_epoch_millis() {
        let t = Utc.with_ymd_and_hms(2025, 8, 22, 12, 0, 0).unwrap();
        let m = MatchRecord::new("a", "b", Arm::Right).at(t);
        assert_eq!(m.epoch_millis(), t.timestamp_millis());
        assert_eq!(m.occurred_at(), t);
    }
}
