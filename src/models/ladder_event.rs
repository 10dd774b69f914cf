//! Rank-changing events emitted while replaying matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a match meant for one competitor on one ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Won while already ranked above the opponent
    Defense,
    /// Won from below and moved into the opponent's slot
    Takeover,
    /// Lost the match
    Lost,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Defense => write!(f, "defense"),
            EventKind::Takeover => write!(f, "takeover"),
            EventKind::Lost => write!(f, "lost"),
        }
    }
}

/// The latest event for one competitor on one ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderEvent {
    pub kind: EventKind,
    pub when: DateTime<Utc>,
    /// Positions gained; zero unless `kind` is a takeover
    pub jump: u32,
}

impl LadderEvent {
    pub fn defense(when: DateTime<Utc>) -> Self {
        Self {
            kind: EventKind::Defense,
            when,
            jump: 0,
        }
    }

    pub fn takeover(when: DateTime<Utc>, jump: u32) -> Self {
        Self {
            kind: EventKind::Takeover,
            when,
            jump,
        }
    }

    pub fn lost(when: DateTime<Utc>) -> Self {
        Self {
            kind: EventKind::Lost,
            when,
            jump: 0,
        }
    }
}
