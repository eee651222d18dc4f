//! Model Module - Scoring Pipeline
//!
//! Tách logic inference khỏi replay loop.
//! Transformer and classifier are opaque, pre-fitted artifacts behind traits,
//! so the backend can be swapped without touching the driver.

pub mod transformer;
pub mod classifier;
pub mod inference;
pub mod threshold;

// Re-export common types
pub use inference::{Evaluation, ModelMetadata, ScoringPipeline};
pub use threshold::{Decision, DecisionPolicy};
pub use transformer::Transformer;
pub use classifier::Classifier;
