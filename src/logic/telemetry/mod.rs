//! Telemetry Module
//!
//! Where every scored flow ends up.
//!
//! ## Structure
//! - `event.rs` - DecisionEvent struct (immutable, timestamped)
//! - `console.rs` - Human-readable log lines per flow
//! - `recorder.rs` - Append-only JSONL writer with size rotation
//!
//! ## Usage
//! ```ignore
//! use crate::logic::telemetry::{ConsoleSink, DecisionSink, Recorder};
//!
//! let mut sinks: Vec<Box<dyn DecisionSink>> = vec![Box::new(ConsoleSink::new())];
//! sinks.push(Box::new(Recorder::new(dir)?));
//!
//! for sink in sinks.iter_mut() {
//!     sink.emit(&flow)?;
//! }
//! ```

pub mod console;
pub mod event;
pub mod recorder;

use crate::logic::dataset::ScoredFlow;

// Re-export main types and functions
pub use console::ConsoleSink;
pub use event::{get_session_id, DecisionEvent};
pub use recorder::Recorder;

/// Destination for scored flows
pub trait DecisionSink: Send {
    fn emit(&mut self, flow: &ScoredFlow) -> std::io::Result<()>;

    /// Called once at shutdown
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
