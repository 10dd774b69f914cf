//! Two replays of the same history: everything, and a past baseline.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::replay::replay;
use super::seed::{seed_ladders, SeededBoard};
use super::timeline::Timeline;
use crate::config::LadderConfig;
use crate::models::{Competitor, MatchRecord, Snapshot};

/// How recency is shown. Mirrors the board's "window" and "show badges" controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencySettings {
    pub window_days: u32,
    pub show_badges: bool,
}

impl From<&LadderConfig> for RecencySettings {
    fn from(config: &LadderConfig) -> Self {
        Self {
            window_days: config.window_days,
            show_badges: config.show_badges,
        }
    }
}

/// Start of the recency window, or `None` when recency display is off.
///
/// The window is exactly `window_days` days long and ends at `now`, so a
/// zero-day window is the instant `now` itself.
pub fn recency_cutoff(settings: RecencySettings, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if !settings.show_badges {
        return None;
    }
    let cutoff = Duration::try_days(settings.window_days.into())
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    Some(cutoff)
}

/// The full-history ladders next to the ladders as of the window start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DualSnapshot {
    pub now: Snapshot,
    pub past: Snapshot,
    /// Start of the recency window; `None` when recency display is off
    pub cutoff: Option<DateTime<Utc>>,
    pub settings: RecencySettings,
}

/// Run the two replays from the same seed.
///
/// With recency display off the past baseline is the full history as well,
/// which makes every delta zero and hides every badge.
pub fn compose(
    seed: &SeededBoard,
    timeline: &Timeline,
    settings: RecencySettings,
    now: DateTime<Utc>,
) -> DualSnapshot {
    let cutoff = recency_cutoff(settings, now);

    DualSnapshot {
        now: replay(seed, timeline, None),
        past: replay(seed, timeline, cutoff),
        cutoff,
        settings,
    }
}

/// Seed, order and compose in one step.
pub fn compute(
    config: &LadderConfig,
    competitors: &[Competitor],
    matches: &[MatchRecord],
    settings: RecencySettings,
    now: DateTime<Utc>,
) -> DualSnapshot {
    let seed = seed_ladders(config, competitors);
    let timeline = Timeline::from_records(matches);
    compose(&seed, &timeline, settings, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Arm, CompetitorId, LadderKey};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, day, hour, 0, 0).unwrap()
    }

    fn roster() -> Vec<Competitor> {
        vec![
            Competitor::new("alice", "Alice", "u60kg").with_seed_rank(1),
            Competitor::new("bob", "Bob", "u60kg").with_seed_rank(2),
            Competitor::new("cara", "Cara", "u60kg").with_seed_rank(3),
        ]
    }

    fn matches() -> Vec<MatchRecord> {
        vec![
            MatchRecord::new("bob", "alice", Arm::Right).at(at(1, 12)).with_row_index(0),
            MatchRecord::new("cara", "alice", Arm::Right).at(at(20, 12)).with_row_index(1),
        ]
    }

    #[test]
    fn test_cutoff_keeps_time_of_day() {
        let settings = RecencySettings {
            window_days: 7,
            show_badges: true,
        };
        assert_eq!(recency_cutoff(settings, at(20, 15)), Some(at(13, 15)));
    }

    #[test]
    fn test_zero_day_window_is_now() {
        let settings = RecencySettings {
            window_days: 0,
            show_badges: true,
        };
        assert_eq!(recency_cutoff(settings, at(20, 15)), Some(at(20, 15)));
    }

    #[test]
    fn test_huge_window_saturates() {
        let settings = RecencySettings {
            window_days: u32::MAX,
            show_badges: true,
        };
        assert_eq!(recency_cutoff(settings, at(20, 15)), Some(DateTime::<Utc>::MIN_UTC));
    }

    #[test]
    fn test_match_earlier_on_boundary_day_is_not_recent() {
        // Window opens at 13th 15:00; a 10:00 match that day belongs to the past
        let settings = RecencySettings {
            window_days: 7,
            show_badges: true,
        };
        let early = vec![MatchRecord::new("bob", "alice", Arm::Right).at(at(13, 10))];
        let dual = compute(&LadderConfig::default(), &roster(), &early, settings, at(20, 15));
        let key = LadderKey::new("u60kg", Arm::Right);

        assert_eq!(dual.past.ladder(&key).unwrap().ids(), dual.now.ladder(&key).unwrap().ids());
        assert_eq!(dual.cutoff, Some(at(13, 15)));
    }

    #[test]
    fn test_no_cutoff_when_badges_hidden() {
        let settings = RecencySettings {
            window_days: 30,
            show_badges: false,
        };
        assert_eq!(recency_cutoff(settings, at(20, 15)), None);
    }

    #[test]
    fn test_past_excludes_matches_inside_window() {
        let settings = RecencySettings {
            window_days: 7,
            show_badges: true,
        };
        let dual = compute(&LadderConfig::default(), &roster(), &matches(), settings, at(21, 9));
        let key = LadderKey::new("u60kg", Arm::Right);

        let now_ids = dual.now.ladder(&key).unwrap().ids();
        let past_ids = dual.past.ladder(&key).unwrap().ids();

        let as_str = |ids: Vec<&CompetitorId>| ids.iter().map(|id| id.as_str().to_string()).collect::<Vec<_>>();
        assert_eq!(as_str(now_ids), vec!["bob", "cara", "alice"]);
        assert_eq!(as_str(past_ids), vec!["bob", "alice", "cara"]);
        assert_eq!(dual.cutoff, Some(at(14, 9)));
    }

    #[test]
    fn test_disabled_recency_degenerates_to_full_history() {
        let settings = RecencySettings {
            window_days: 7,
            show_badges: false,
        };
        let dual = compute(&LadderConfig::default(), &roster(), &matches(), settings, at(21, 9));

        assert_eq!(dual.past.ladders, dual.now.ladders);
        assert_eq!(dual.past.last_events, dual.now.last_events);
        assert_eq!(dual.cutoff, None);
    }

    #[test]
    fn test_settings_from_config() {
        let settings = RecencySettings::from(&LadderConfig::default());
        assert_eq!(settings.window_days, 30);
        assert!(settings.show_badges);
    }
}
