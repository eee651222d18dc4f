//! Feature Transformer
//!
//! Fitted scaler loaded from a JSON artifact exported by the training side
//! (`mean_`/`scale_` of a StandardScaler or `data_min_`/`data_max_` of a
//! MinMaxScaler). Parameters are read once and never change.

use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::logic::error::RouterError;
use crate::logic::features::layout;

/// Pre-fitted feature transformation
pub trait Transformer: Send + Sync {
    /// Number of features the transformer was fitted on
    fn n_features(&self) -> usize;
    fn transform(&self, raw: &[f32]) -> Vec<f32>;
}

/// Serialized scaler parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerParams {
    Standard {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        mean: Vec<f32>,
        scale: Vec<f32>,
    },
    MinMax {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        data_min: Vec<f32>,
        data_max: Vec<f32>,
    },
}

impl ScalerParams {
    pub fn kind(&self) -> &'static str {
        match self {
            ScalerParams::Standard { .. } => "standard",
            ScalerParams::MinMax { .. } => "min_max",
        }
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            ScalerParams::Standard { feature_names, .. }
            | ScalerParams::MinMax { feature_names, .. } => feature_names.as_deref(),
        }
    }
}

/// Scaler with offset/divisor precomputed: `(x - offset) / divisor`
#[derive(Debug, Clone)]
pub struct FittedScaler {
    kind: &'static str,
    offset: Array1<f32>,
    divisor: Array1<f32>,
}

impl FittedScaler {
    /// Build from parameters, checking them against the feature layout
    pub fn from_params(params: ScalerParams) -> Result<Self, RouterError> {
        if let Some(names) = params.feature_names() {
            layout::validate_names(names)?;
        }

        let kind = params.kind();
        let (offset, divisor) = match params {
            ScalerParams::Standard { mean, scale, .. } => {
                check_len("mean", &mean)?;
                check_len("scale", &scale)?;
                // Constant features are fitted with a zero scale; sklearn stores 1.0 there
                let scale: Vec<f32> = scale.into_iter().map(|s| if s == 0.0 { 1.0 } else { s }).collect();
                (mean, scale)
            }
            ScalerParams::MinMax { data_min, data_max, .. } => {
                check_len("data_min", &data_min)?;
                check_len("data_max", &data_max)?;
                let mut range = Vec::with_capacity(data_min.len());
                for (index, (min, max)) in data_min.iter().zip(&data_max).enumerate() {
                    if min.is_nan() || max.is_nan() || max < min {
                        return Err(RouterError::SchemaMismatch(format!(
                            "scaler range of '{}' is invalid (min {}, max {})",
                            layout::feature_name(index).unwrap_or("?"),
                            min,
                            max
                        )));
                    }
                    // Same rule as a zero scale: constant features keep their offset only
                    range.push(if max == min { 1.0 } else { max - min });
                }
                (data_min, range)
            }
        };

        Ok(Self {
            kind,
            offset: Array1::from(offset),
            divisor: Array1::from(divisor),
        })
    }

    /// Load from a JSON artifact
    pub fn load(path: &Path) -> Result<Self, RouterError> {
        let bytes = std::fs::read(path).map_err(|e| RouterError::artifact(path, e))?;
        let params: ScalerParams =
            serde_json::from_slice(&bytes).map_err(|e| RouterError::artifact(path, e))?;
        Self::from_params(params)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl Transformer for FittedScaler {
    fn n_features(&self) -> usize {
        self.offset.len()
    }

    fn transform(&self, raw: &[f32]) -> Vec<f32> {
        let x = Array1::from(raw.to_vec());
        ((&x - &self.offset) / &self.divisor).to_vec()
    }
}

fn check_len(field: &str, values: &[f32]) -> Result<(), RouterError> {
    if values.len() != layout::FEATURE_COUNT {
        return Err(RouterError::SchemaMismatch(format!(
            "scaler '{}' has {} entries, layout expects {}",
            field,
            values.len(),
            layout::FEATURE_COUNT
        )));
    }
    Ok(())
}
