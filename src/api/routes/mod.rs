pub mod board;
pub mod refresh;
