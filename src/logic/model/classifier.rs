//! Binary Classifier - ONNX Runtime Integration
//!
//! Load và chạy classifier artifact. Two backends:
//! - `.onnx`: model exported from the training side, run with ONNX Runtime
//! - `.json`: logistic model (coefficients + intercept), no runtime needed

use std::path::Path;

use ndarray::Array2;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Value;

use crate::logic::error::RouterError;

/// Output name used by skl2onnx for class probabilities (zipmap disabled)
pub const PROBABILITIES_OUTPUT: &str = "probabilities";

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait cho classifier backends (ONNX, logistic, ...)
pub trait Classifier: Send + Sync {
    /// Probability mass of the malicious class for one transformed vector
    fn predict_proba(&self, features: &[f32]) -> Result<f32, RouterError>;
    fn n_features(&self) -> usize;
    fn backend(&self) -> &'static str;
}

/// Load the classifier backend matching the artifact extension
pub fn load_classifier(
    path: &Path,
    n_features: usize,
    output: Option<&str>,
) -> Result<Box<dyn Classifier>, RouterError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("onnx") => Ok(Box::new(OnnxClassifier::load(path, n_features, output)?)),
        Some("json") => Ok(Box::new(LogisticClassifier::load(path)?)),
        _ => Err(RouterError::artifact(path, "unsupported classifier format (expected .onnx or .json)")),
    }
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

pub struct OnnxClassifier {
    // run() needs &mut Session
    session: Mutex<Session>,
    output_name: String,
    n_features: usize,
}

impl OnnxClassifier {
    /// Load ONNX model từ file
    pub fn load(path: &Path, n_features: usize, output: Option<&str>) -> Result<Self, RouterError> {
        log::info!("Loading ONNX classifier from: {}", path.display());

        if !path.exists() {
            return Err(RouterError::artifact(path, "file not found"));
        }

        let session = Session::builder()
            .map_err(|e| RouterError::artifact(path, format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RouterError::artifact(path, format!("optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| RouterError::artifact(path, e))?;

        let names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let output_name = select_output(&names, output).map_err(|e| RouterError::artifact(path, e))?;

        log::info!("ONNX classifier ready (output: {})", output_name);

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            n_features,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<f32, RouterError> {
        let input = Array2::<f32>::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| RouterError::Inference(format!("array error: {}", e)))?;

        let input_tensor = Value::from_array(input)
            .map_err(|e| RouterError::Inference(format!("tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| RouterError::Inference(e.to_string()))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| RouterError::Inference(format!("missing output '{}'", self.output_name)))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| RouterError::Inference(format!("extract error: {}", e)))?;

        probability_from_output(data)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn backend(&self) -> &'static str {
        "onnx"
    }
}

/// The configured output when the model has it; otherwise `probabilities`,
/// falling back to the last output
fn select_output(names: &[String], wanted: Option<&str>) -> Result<String, String> {
    match wanted {
        Some(wanted) if names.iter().any(|n| n == wanted) => Ok(wanted.to_string()),
        Some(wanted) => Err(format!("output '{}' not found (model outputs: {:?})", wanted, names)),
        None => names
            .iter()
            .find(|n| n.as_str() == PROBABILITIES_OUTPUT)
            .or_else(|| names.last())
            .cloned()
            .ok_or_else(|| "model defines no outputs".to_string()),
    }
}

/// `[p_benign, p_malicious]` → column 1; a single value is the probability itself
fn probability_from_output(data: &[f32]) -> Result<f32, RouterError> {
    match data {
        [p] => Ok(p.clamp(0.0, 1.0)),
        [_, p, ..] => Ok(p.clamp(0.0, 1.0)),
        [] => Err(RouterError::Inference("empty classifier output".to_string())),
    }
}

// ============================================================================
// LOGISTIC IMPLEMENTATION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinearParams {
    Logistic { coefficients: Vec<f32>, intercept: f32 },
}

#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    coefficients: Vec<f32>,
    intercept: f32,
}

impl LogisticClassifier {
    pub fn new(coefficients: Vec<f32>, intercept: f32) -> Self {
        Self { coefficients, intercept }
    }

    pub fn load(path: &Path) -> Result<Self, RouterError> {
        let bytes = std::fs::read(path).map_err(|e| RouterError::artifact(path, e))?;
        let LinearParams::Logistic { coefficients, intercept } =
            serde_json::from_slice(&bytes).map_err(|e| RouterError::artifact(path, e))?;
        Ok(Self::new(coefficients, intercept))
    }
}

impl Classifier for LogisticClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<f32, RouterError> {
        if features.len() != self.coefficients.len() {
            return Err(RouterError::SchemaMismatch(format!(
                "classifier expects {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }

        let z: f32 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.intercept;

        Ok(1.0 / (1.0 + (-z).exp()))
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn backend(&self) -> &'static str {
        "logistic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_select_configured_output() {
        let names = outputs(&["label", "probabilities", "scores"]);
        assert_eq!(select_output(&names, Some("scores")).unwrap(), "scores");

        let err = select_output(&names, Some("proba")).unwrap_err();
        assert!(err.contains("'proba' not found"));
    }

    #[test]
    fn test_select_default_output() {
        let names = outputs(&["label", "probabilities", "scores"]);
        assert_eq!(select_output(&names, None).unwrap(), PROBABILITIES_OUTPUT);

        // No probabilities output: last one wins
        let names = outputs(&["label", "output_probability"]);
        assert_eq!(select_output(&names, None).unwrap(), "output_probability");

        assert!(select_output(&[], None).is_err());
    }

    #[test]
    fn test_probability_from_output() {
        assert_eq!(probability_from_output(&[0.27, 0.73]).unwrap(), 0.73);
        assert_eq!(probability_from_output(&[0.4]).unwrap(), 0.4);
        assert_eq!(probability_from_output(&[1.7]).unwrap(), 1.0);
        assert!(probability_from_output(&[]).is_err());
    }

    #[test]
    fn test_logistic_zero_logit() {
        let clf = LogisticClassifier::new(vec![0.0; 3], 0.0);
        assert!((clf.predict_proba(&[1.0, 2.0, 3.0]).unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_logistic_monotonic() {
        let clf = LogisticClassifier::new(vec![1.0, 0.0], -1.0);
        let low = clf.predict_proba(&[0.0, 5.0]).unwrap();
        let high = clf.predict_proba(&[4.0, 5.0]).unwrap();
        assert!(low < 0.5);
        assert!(high > 0.5);
    }

    #[test]
    fn test_logistic_length_mismatch() {
        let clf = LogisticClassifier::new(vec![1.0; 4], 0.0);
        assert!(matches!(clf.predict_proba(&[1.0]), Err(RouterError::SchemaMismatch(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_classifier(Path::new("model.joblib"), 78, None).err().unwrap();
        assert!(matches!(err, RouterError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_missing_onnx_file() {
        let err = load_classifier(Path::new("/nonexistent/model.onnx"), 78, None).err().unwrap();
        assert!(matches!(err, RouterError::ArtifactLoad { .. }));
    }
}
