//! Rank deltas and recency badges, and the board built from them.

use serde::Serialize;

use super::compose::{DualSnapshot, RecencySettings};
use crate::config::LadderConfig;
use crate::models::{CompetitorId, EventKind, LadderKey, RankedEntry};

/// A visible recency indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Badge {
    /// Took a higher rank recently; `up` is the number of positions gained
    Takeover { up: Option<u32> },
    /// Defended their rank recently
    Defense,
}

/// One competitor's row on a ladder, with how they moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub id: CompetitorId,
    pub name: String,
    pub base_class: String,
    pub rank: u32,
    /// Rank in the past baseline, if they were on this ladder then
    pub was_rank: Option<u32>,
    /// Positions moved since the baseline; positive means up
    pub delta: Option<i64>,
    pub badge: Option<Badge>,
}

/// Work out the delta and badge for one entry of the `now` ladder `key`.
pub fn evaluate(dual: &DualSnapshot, key: &LadderKey, entry: &RankedEntry) -> Standing {
    let was_rank = dual.past.rank_of(key, &entry.id);
    let delta = was_rank.map(|was| i64::from(was) - i64::from(entry.rank));

    let badge = match dual.cutoff {
        Some(cutoff) if dual.settings.show_badges => dual
            .now
            .last_event(key, &entry.id)
            .filter(|evt| evt.when >= cutoff)
            .and_then(|evt| match evt.kind {
                EventKind::Takeover => {
                    let jump = dual.now.last_jump(key, &entry.id).unwrap_or(0);
                    let up = if jump > 0 {
                        Some(jump)
                    } else {
                        delta.filter(|d| *d > 0).map(|d| d as u32)
                    };
                    Some(Badge::Takeover { up })
                }
                EventKind::Defense => Some(Badge::Defense),
                EventKind::Lost => None,
            }),
        _ => None,
    };

    Standing {
        id: entry.id.clone(),
        name: entry.name.clone(),
        base_class: entry.base_class.clone(),
        rank: entry.rank,
        was_rank,
        delta,
        badge,
    }
}

/// One ladder as the board shows it.
#[derive(Debug, Clone, Serialize)]
pub struct LadderView {
    pub key: LadderKey,
    /// Heading for the ladder, e.g. "Open Right Arm"
    pub label: String,
    pub champion: Option<CompetitorId>,
    /// Competitors on the ladder, including any beyond the display limit
    pub total: usize,
    pub standings: Vec<Standing>,
}

/// Every ladder with deltas and badges applied.
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub ladders: Vec<LadderView>,
    pub cutoff: Option<chrono::DateTime<chrono::Utc>>,
    pub settings: RecencySettings,
}

/// Build the view of one ladder, keeping at most `limit` rows.
pub fn ladder_view(dual: &DualSnapshot, key: &LadderKey, limit: Option<usize>) -> Option<LadderView> {
    let ladder = dual.now.ladder(key)?;
    let shown = limit.unwrap_or(usize::MAX);

    Some(LadderView {
        key: key.clone(),
        label: format!("{} Arm", key),
        champion: ladder.entries.first().map(|e| e.id.clone()),
        total: ladder.entries.len(),
        standings: ladder
            .entries
            .iter()
            .take(shown)
            .map(|entry| evaluate(dual, key, entry))
            .collect(),
    })
}

/// Build the whole board using the configured display limits.
pub fn board_view(dual: &DualSnapshot, config: &LadderConfig) -> BoardView {
    let ladders = dual
        .now
        .ladders
        .iter()
        .filter_map(|l| ladder_view(dual, &l.key, Some(config.display_limit(&l.key))))
        .collect();

    BoardView {
        ladders,
        cutoff: dual.cutoff,
        settings: dual.settings,
    }
}
