//! Core data models for the ladder board.

mod competitor;
mod ids;
mod ladder_event;
mod match_record;
mod snapshot;

pub use competitor::*;
pub use ids::*;
pub use ladder_event::*;
pub use match_record::*;
pub use snapshot::*;
