//! Competitors and the ladders they can appear on.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::CompetitorId;

/// Which arm a ladder (or a match) is contested with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Arm {
    Right,
    Left,
}

impl Arm {
    /// Both arms, in display order.
    pub const ALL: [Arm; 2] = [Arm::Right, Arm::Left];

    /// Read an arm indicator such as "L", "left" or "Right hand".
    ///
    /// Only the first letter counts; anything else yields `None`.
    pub fn from_indicator(raw: &str) -> Option<Self> {
        match raw.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('l') => Some(Arm::Left),
            Some('r') => Some(Arm::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arm::Right => write!(f, "Right"),
            Arm::Left => write!(f, "Left"),
        }
    }
}

/// Identifies one ladder: a weight group contested with one arm.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct LadderKey {
    pub group: String,
    pub arm: Arm,
}

impl LadderKey {
    pub fn new(group: impl Into<String>, arm: Arm) -> Self {
        Self {
            group: group.into(),
            arm,
        }
    }
}

impl fmt::Display for LadderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.group, self.arm)
    }
}

impl Serialize for LadderKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A competitor's slot on one ladder; serialized as `"<ladder>:<competitor>"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub ladder: LadderKey,
    pub competitor: CompetitorId,
}

impl SlotKey {
    pub fn new(ladder: &LadderKey, competitor: &CompetitorId) -> Self {
        Self {
            ladder: ladder.clone(),
            competitor: competitor.clone(),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ladder, self.competitor)
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A roster entry. Read-only to the ladder engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: CompetitorId,

    /// Display name
    pub name: String,

    /// Declared weight class, e.g. "u75kg" or "women"
    pub base_class: String,

    /// Inactive competitors are left off every ladder
    pub active: bool,

    /// Declared starting rank; unranked competitors seed below ranked ones
    pub seed_rank: Option<u32>,
}

impl Competitor {
    pub fn new(id: impl Into<CompetitorId>, name: impl Into<String>, base_class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_class: base_class.into(),
            active: true,
            seed_rank: None,
        }
    }

    /// Builder method to set the seed rank.
    pub fn with_seed_rank(mut self, rank: u32) -> Self {
        self.seed_rank = Some(rank);
        self
    }

    /// Builder method to set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}
