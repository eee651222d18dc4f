//! Features Module - Flow Feature Schema
//!
//! Fixed 78-field layout of a replayed flow, the immutable vector built from
//! it and the TCP flag inspection used in decision records.

pub mod layout;
pub mod vector;
pub mod flags;


// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION, LayoutInfo};
pub use vector::{FeatureVector, FeatureVectorBuilder};
pub use flags::{TcpFlag, format_flags};
