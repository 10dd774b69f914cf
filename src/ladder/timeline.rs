//! A single deterministic order over match records.
//!
//! Matches are ordered by the tuple
//! `(timestamp millis, sequence, source row, winner id, loser id, arm, weight class)`:
//! - an unreadable timestamp counts as the Unix epoch, so such rows replay first;
//! - a missing sequence sorts after every declared sequence at the same instant;
//! - the source row index is unique within one load, which makes the order
//!   strict; the remaining fields keep it strict across loads as well.
//!
//! The order never depends on the order records arrive in.

use std::cmp::Ordering;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::{Captures, Regex};

use crate::models::MatchRecord;

fn iso_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[ T](\d{1,2})(?::(\d{1,2})(?::(\d{1,2}))?)?)?$")
            .expect("valid ISO date pattern")
    })
}

fn slash_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})(?:[ T](\d{1,2})(?::(\d{1,2})(?::(\d{1,2}))?)?)?$")
            .expect("valid slash date pattern")
    })
}

fn number(caps: &Captures, idx: usize) -> Option<u32> {
    caps.get(idx).and_then(|m| m.as_str().parse().ok())
}

/// Time of day from capture groups 4..=6; a missing time means 12:00:00.
fn time_of_day(caps: &Captures) -> Option<NaiveTime> {
    let hour = caps.get(4).map_or(Some(12), |m| m.as_str().parse().ok())?;
    let minute = number(caps, 5).unwrap_or(0);
    let second = number(caps, 6).unwrap_or(0);
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Parse a match date (with optional time) as UTC.
///
/// Accepts `YYYY-MM-DD[ HH[:MM[:SS]]]` (a `T` separator works too) and
/// slash dates `A/B/YYYY` with the same optional time. Slash dates are read
/// month-first unless the first number exceeds 12, in which case they are read
/// day-first. When both numbers are 12 or below the date is always read
/// month-first: `03/04/2025` is March 4th even if the sheet meant April 3rd.
///
/// Dates that do not exist on the calendar (`2025-02-30`) and out-of-range
/// times (`25:00`) are rejected rather than rolled over into the following
/// month or day; the match then counts as undated.
///
/// A date without a time is placed at 12:00:00 UTC so that it cannot drift
/// across a day boundary. Anything else returns `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = iso_pattern().captures(text) {
        let year = caps.get(1)?.as_str().parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, number(&caps, 2)?, number(&caps, 3)?)?;
        return Some(date.and_time(time_of_day(&caps)?).and_utc());
    }

    if let Some(caps) = slash_pattern().captures(text) {
        let first = number(&caps, 1)?;
        let second = number(&caps, 2)?;
        let year = caps.get(3)?.as_str().parse().ok()?;
        let (month, day) = if first > 12 { (second, first) } else { (first, second) };
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        return Some(date.and_time(time_of_day(&caps)?).and_utc());
    }

    None
}

/// Total order over match records.
pub fn compare(a: &MatchRecord, b: &MatchRecord) -> Ordering {
    a.epoch_millis()
        .cmp(&b.epoch_millis())
        .then_with(|| a.sequence.is_none().cmp(&b.sequence.is_none()))
        .then_with(|| match (a.sequence, b.sequence) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        })
        .then_with(|| a.row_index.cmp(&b.row_index))
        .then_with(|| a.winner.cmp(&b.winner))
        .then_with(|| a.loser.cmp(&b.loser))
        .then_with(|| a.arm.cmp(&b.arm))
        .then_with(|| a.weight_class.cmp(&b.weight_class))
        .then_with(|| a.timestamp.is_some().cmp(&b.timestamp.is_some()))
        .then_with(|| a.badge_suppressed.cmp(&b.badge_suppressed))
}

/// Matches that can be replayed, in replay order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    matches: Vec<MatchRecord>,
}

impl Timeline {
    /// Drop records without an arm and sort the rest.
    pub fn from_records(records: &[MatchRecord]) -> Self {
        let mut matches: Vec<MatchRecord> =
            records.iter().filter(|m| m.arm.is_some()).cloned().collect();
        matches.sort_by(compare);
        Self { matches }
    }

    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
