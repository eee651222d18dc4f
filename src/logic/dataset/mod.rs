//! Dataset Module - Replay Input & Decision Records
//!
//! Loads the recorded flows the simulator replays and defines the record
//! produced for each replayed flow.

pub mod replay;
pub mod record;


pub use record::{flow_id, ScoredFlow};
pub use replay::{ReplayBuffer, ReplayEntry};
