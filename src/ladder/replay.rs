//! Replays the match timeline over seeded ladders.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::seed::{Ladder, SeededBoard};
use super::timeline::Timeline;
use crate::models::{
    CompetitorId, LadderEvent, LadderKey, MatchRecord, RankedEntry, RankedLadder, SlotKey,
    Snapshot,
};

/// Result of applying the challenge rule to one ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    /// The winner already ranked above the loser; order is unchanged.
    Defense,
    /// The winner ranked below the loser and takes the loser's slot.
    Takeover {
        order: Vec<CompetitorId>,
        /// Positions gained by the winner
        jump: u32,
    },
}

/// Apply the challenge rule for `winner` beating `loser`.
///
/// Returns `None` when either competitor is absent from `order`, in which case
/// the match does not touch this ladder. On a takeover the winner is removed
/// from their slot and reinserted at the loser's slot, and everyone in between
/// slides down one place. The input order is never modified.
pub fn challenge(order: &[CompetitorId], winner: &CompetitorId, loser: &CompetitorId) -> Option<Challenge> {
    let wi = order.iter().position(|id| id == winner)?;
    let li = order.iter().position(|id| id == loser)?;

    if wi < li {
        Some(Challenge::Defense)
    } else if wi > li {
        let mut next = order.to_vec();
        let moved = next.remove(wi);
        next.insert(li, moved);
        Some(Challenge::Takeover {
            order: next,
            jump: (wi - li) as u32,
        })
    } else {
        // Winner and loser are the same id
        None
    }
}

/// Latest event and takeover jump per competitor per ladder.
#[derive(Debug, Clone, Default)]
struct EventLog {
    last_events: BTreeMap<SlotKey, LadderEvent>,
    last_jumps: BTreeMap<SlotKey, u32>,
}

impl EventLog {
    fn record(&mut self, key: &LadderKey, record: &MatchRecord, outcome: &Challenge) {
        let when = record.occurred_at();
        let winner = SlotKey::new(key, &record.winner);
        let loser = SlotKey::new(key, &record.loser);

        match outcome {
            Challenge::Defense => {
                self.last_events.insert(winner.clone(), LadderEvent::defense(when));
                self.last_jumps.remove(&winner);
            }
            Challenge::Takeover { jump, .. } => {
                self.last_events.insert(winner.clone(), LadderEvent::takeover(when, *jump));
                self.last_jumps.insert(winner, *jump);
            }
        }

        self.last_events.insert(loser.clone(), LadderEvent::lost(when));
        self.last_jumps.remove(&loser);
    }
}

/// Replay every match up to `cutoff` (all of them when `None`).
///
/// Works on its own copy of the seeded ladders, so replays with different
/// cutoffs never observe each other's state.
pub fn replay(seed: &SeededBoard, timeline: &Timeline, cutoff: Option<DateTime<Utc>>) -> Snapshot {
    let mut ladders: Vec<Ladder> = seed.ladders.clone();
    let mut log = EventLog::default();
    let mut applied = 0usize;
    let mut touched = 0usize;

    for record in timeline.matches() {
        let Some(arm) = record.arm else {
            continue;
        };
        if cutoff.is_some_and(|c| record.occurred_at() > c) {
            continue;
        }
        applied += 1;

        for ladder in ladders.iter_mut().filter(|l| l.key.arm == arm) {
            let Some(outcome) = challenge(&ladder.order, &record.winner, &record.loser) else {
                continue;
            };
            touched += 1;

            if !record.badge_suppressed {
                log.record(&ladder.key, record, &outcome);
            }
            if let Challenge::Takeover { order, .. } = outcome {
                ladder.order = order;
            }
        }
    }

    debug!(
        "Replayed {} of {} matches ({} ladder updates), cutoff {:?}",
        applied,
        timeline.len(),
        touched,
        cutoff
    );

    Snapshot {
        ladders: ladders.iter().map(|l| rank_ladder(seed, l)).collect(),
        last_events: log.last_events,
        last_jumps: log.last_jumps,
        cutoff,
    }
}

fn rank_ladder(seed: &SeededBoard, ladder: &Ladder) -> RankedLadder {
    let entries = ladder
        .order
        .iter()
        .filter_map(|id| seed.competitor(id))
        .enumerate()
        .map(|(i, c)| RankedEntry {
            id: c.id.clone(),
            name: c.name.clone(),
            base_class: c.base_class.clone(),
            rank: i as u32 + 1,
        })
        .collect();

    RankedLadder {
        key: ladder.key.clone(),
        entries,
    }
}
