//! The ladder replay engine.
//!
//! Pure functions of the loaded records:
//! - **eligibility**: which ladders a base weight class cascades into
//! - **seed**: initial ladder order from declared ranks
//! - **timeline**: a deterministic total order over match records
//! - **replay**: the challenge rule folded over the timeline
//! - **compose**: the full-history and past-baseline replays
//! - **badge**: rank deltas and recency badges

pub mod badge;
pub mod compose;
pub mod eligibility;
pub mod replay;
pub mod seed;
pub mod timeline;

pub use badge::{board_view, ladder_view, Badge, BoardView, LadderView, Standing};
pub use compose::{compose, compute, recency_cutoff, DualSnapshot, RecencySettings};
pub use replay::{challenge, replay, Challenge};
pub use seed::{seed_ladders, Ladder, SeededBoard};
pub use timeline::{parse_timestamp, Timeline};
