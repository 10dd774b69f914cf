//! Final ladder standings as of one cutoff.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{CompetitorId, LadderEvent, LadderKey, SlotKey};

/// One row of a ranked ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub id: CompetitorId,
    pub name: String,
    pub base_class: String,
    /// 1-based position on the ladder
    pub rank: u32,
}

/// A ladder's final order with ranks attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedLadder {
    pub key: LadderKey,
    pub entries: Vec<RankedEntry>,
}

impl RankedLadder {
    pub fn rank_of(&self, id: &CompetitorId) -> Option<u32> {
        self.entries.iter().find(|e| &e.id == id).map(|e| e.rank)
    }

    pub fn ids(&self) -> Vec<&CompetitorId> {
        self.entries.iter().map(|e| &e.id).collect()
    }
}

/// Every ladder after replaying matches up to `cutoff`, with the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Ladders in display order
    pub ladders: Vec<RankedLadder>,

    /// Latest event per competitor per ladder
    pub last_events: BTreeMap<SlotKey, LadderEvent>,

    /// Positions gained by each competitor's most recent takeover, if that
    /// takeover is still their latest event
    pub last_jumps: BTreeMap<SlotKey, u32>,

    /// Matches after this instant were left out; `None` means all were applied
    pub cutoff: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn ladder(&self, key: &LadderKey) -> Option<&RankedLadder> {
        self.ladders.iter().find(|l| &l.key == key)
    }

    pub fn rank_of(&self, key: &LadderKey, id: &CompetitorId) -> Option<u32> {
        self.ladder(key).and_then(|l| l.rank_of(id))
    }

    pub fn last_event(&self, key: &LadderKey, id: &CompetitorId) -> Option<&LadderEvent> {
        self.last_events.get(&SlotKey::new(key, id))
    }

    pub fn last_jump(&self, key: &LadderKey, id: &CompetitorId) -> Option<u32> {
        self.last_jumps.get(&SlotKey::new(key, id)).copied()
    }
}
