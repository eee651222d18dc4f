//! Feature Vector - Core data structure for ML input
//!
//! **Versioned, immutable flow feature vector**
//!
//! Values are stored in the order defined by `FEATURE_LAYOUT`. The vector
//! never changes after construction; a row with the wrong number of cells is
//! still representable so that the scoring pipeline can reject it as a schema
//! mismatch instead of the loader silently padding it.

use serde::{Deserialize, Serialize};

use super::flags::{active_flags, TcpFlag};
use super::layout::{
    feature_index, feature_name, layout_hash, FEATURE_COUNT, FEATURE_VERSION, FLOW_DURATION,
};
use crate::logic::error::RouterError;

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    version: u8,
    /// CRC32 hash of the feature layout
    layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    values: Vec<f32>,
}

impl FeatureVector {
    /// Create from raw values with current version
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// All-zero vector of the current layout
    pub fn zeroed() -> Self {
        Self::new(vec![0.0; FEATURE_COUNT])
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn layout_hash(&self) -> u32 {
        self.layout_hash
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Get feature by index
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Get feature by name
    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        feature_index(name).and_then(|i| self.get(i))
    }

    /// Flow duration as recorded by the flow meter
    pub fn flow_duration(&self) -> f32 {
        self.get_by_name(FLOW_DURATION).unwrap_or(0.0)
    }

    /// TCP flags with a nonzero count, in SYN, FIN, ACK, PSH order
    pub fn active_flags(&self) -> Vec<TcpFlag> {
        active_flags(self)
    }

    /// Validate that this vector can be fed to a model fitted on `expected` features.
    ///
    /// Rejects a wrong length and non-finite cells (unparseable or
    /// `Infinity`/`NaN` entries in the source row).
    pub fn validate(&self, expected: usize) -> Result<(), RouterError> {
        if self.values.len() != expected {
            return Err(RouterError::SchemaMismatch(format!(
                "vector has {} features, model expects {}",
                self.values.len(),
                expected
            )));
        }

        if let Some(index) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(RouterError::SchemaMismatch(format!(
                "non-finite value {} in '{}'",
                self.values[index],
                feature_name(index).unwrap_or("?")
            )));
        }

        Ok(())
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

// ============================================================================
// BUILDER PATTERN
// ============================================================================

/// Builder for creating a FeatureVector with named setters (fixtures, demos)
pub struct FeatureVectorBuilder {
    values: Vec<f32>,
}

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self { values: vec![0.0; FEATURE_COUNT] }
    }

    pub fn flow_duration(self, value: f32) -> Self {
        self.set(FLOW_DURATION, value)
    }

    pub fn destination_port(self, value: f32) -> Self {
        self.set("Destination Port", value)
    }

    /// Set the count column of a TCP flag
    pub fn flag_count(self, flag: TcpFlag, value: f32) -> Self {
        self.set(flag.column(), value)
    }

    /// Set feature by name; unknown names are ignored
    pub fn set(mut self, name: &str, value: f32) -> Self {
        if let Some(index) = feature_index(name) {
            self.values[index] = value;
        }
        self
    }

    pub fn build(self) -> FeatureVector {
        FeatureVector::new(self.values)
    }
}

impl Default for FeatureVectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_new() {
        let vector = FeatureVector::zeroed();
        assert_eq!(vector.version(), FEATURE_VERSION);
        assert_eq!(vector.layout_hash(), layout_hash());
        assert_eq!(vector.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_feature_vector_builder() {
        let vector = FeatureVectorBuilder::new()
            .destination_port(443.0)
            .flow_duration(120.0)
            .build();

        assert_eq!(vector.get_by_name("Destination Port"), Some(443.0));
        assert_eq!(vector.flow_duration(), 120.0);
        assert_eq!(vector.get_by_name("nonexistent"), None);
    }

    #[test]
    fn test_validate_ok() {
        assert!(FeatureVector::zeroed().validate(FEATURE_COUNT).is_ok());
    }

    #[test]
    fn test_validate_wrong_length() {
        let vector = FeatureVector::new(vec![1.0; 77]);
        let err = vector.validate(FEATURE_COUNT).unwrap_err();
        assert!(matches!(err, RouterError::SchemaMismatch(_)));
    }

    #[test]
    fn test_validate_non_finite() {
        let vector = FeatureVectorBuilder::new().set("Flow Bytes/s", f32::INFINITY).build();
        let err = vector.validate(FEATURE_COUNT).unwrap_err();
        assert!(err.to_string().contains("Flow Bytes/s"));
    }
}
