//! Flow Router Simulator
//!
//! Replays recorded network flows through a pre-trained scoring model and
//! logs the ALLOW / BLOCK decision for each one.

pub mod constants;
pub mod logic;
