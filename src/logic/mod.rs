//! Logic Module - Flow Scoring & Replay
//!
//! Chứa pipeline xử lý: Replay Buffer -> Scoring -> Decision -> Verification -> Sinks.
//!
//! ## Architecture
//! - `features/` - Fixed flow feature layout, vectors, TCP flags
//! - `model/` - Transformer + classifier artifacts, decision threshold
//! - `dataset/` - Replay buffer (CSV) and scored flow records
//! - `telemetry/` - Console and JSONL decision sinks
//! - `replay_loop` - Driver state machine

pub mod config;
pub mod error;

pub mod features;
pub mod model;
pub mod verification;
pub mod monitor;
pub mod dataset;
pub mod telemetry;
pub mod status;
pub mod replay_loop;
