//! Scoring Pipeline - transformer + classifier
//!
//! Loads both artifacts once at INIT and exposes `score(vector) -> probability`.
//! Artifacts are immutable for the process lifetime, so one pipeline can be
//! shared across threads; only the latency counters are updated per call.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::classifier::{load_classifier, Classifier};
use super::transformer::{FittedScaler, Transformer};
use crate::logic::error::RouterError;
use crate::logic::features::layout::{layout_hash, FEATURE_COUNT, FEATURE_VERSION};
use crate::logic::features::FeatureVector;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub transformer_path: String,
    pub transformer_kind: String,
    pub transformer_sha256: String,
    pub classifier_path: String,
    pub classifier_backend: String,
    pub classifier_sha256: String,
    pub features: usize,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Output of one transform+score pass
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub transformed: Vec<f32>,
    /// Probability of the malicious class (0.0 - 1.0)
    pub probability: f32,
    /// Wall-clock time of transform + score
    pub latency: Duration,
}

/// Pipeline status for the run summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub classifier_backend: String,
    pub avg_latency_ms: f64,
    pub inference_count: u64,
}

// ============================================================================
// SCORING PIPELINE
// ============================================================================

pub struct ScoringPipeline {
    transformer: Box<dyn Transformer>,
    classifier: Box<dyn Classifier>,
    metadata: Option<ModelMetadata>,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl ScoringPipeline {
    /// Assemble from already-loaded components.
    ///
    /// Both sides must agree on the fitted feature count.
    pub fn new(
        transformer: Box<dyn Transformer>,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, RouterError> {
        if transformer.n_features() != classifier.n_features() {
            return Err(RouterError::SchemaMismatch(format!(
                "transformer fitted on {} features, classifier on {}",
                transformer.n_features(),
                classifier.n_features()
            )));
        }

        Ok(Self {
            transformer,
            classifier,
            metadata: None,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        })
    }

    /// Load both artifacts from disk
    pub fn load(
        transformer_path: &Path,
        classifier_path: &Path,
        classifier_output: Option<&str>,
    ) -> Result<Self, RouterError> {
        log::info!("Loading scaler from: {}", transformer_path.display());
        let transformer_sha256 = fingerprint(transformer_path)?;
        let scaler = FittedScaler::load(transformer_path)?;
        let transformer_kind = scaler.kind().to_string();

        let classifier_sha256 = fingerprint(classifier_path)?;
        let classifier = load_classifier(classifier_path, scaler.n_features(), classifier_output)?;
        let classifier_backend = classifier.backend().to_string();

        let mut pipeline = Self::new(Box::new(scaler), classifier)?;

        let metadata = ModelMetadata {
            transformer_path: transformer_path.display().to_string(),
            transformer_kind,
            transformer_sha256,
            classifier_path: classifier_path.display().to_string(),
            classifier_backend,
            classifier_sha256,
            features: FEATURE_COUNT,
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            loaded_at: chrono::Utc::now(),
        };

        log::info!(
            "Scoring pipeline ready: {} scaler ({}…), {} classifier ({}…), layout v{} ({:08x})",
            metadata.transformer_kind,
            &metadata.transformer_sha256[..12],
            metadata.classifier_backend,
            &metadata.classifier_sha256[..12],
            metadata.feature_version,
            metadata.layout_hash
        );

        pipeline.metadata = Some(metadata);
        Ok(pipeline)
    }

    /// Fitted feature count
    pub fn n_features(&self) -> usize {
        self.transformer.n_features()
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    /// Transform and score one vector, measuring latency
    pub fn evaluate(&self, raw: &FeatureVector) -> Result<Evaluation, RouterError> {
        raw.validate(self.n_features())?;

        let start_time = Instant::now();
        let transformed = self.transformer.transform(raw.as_slice());
        let probability = self.classifier.predict_proba(&transformed)?;
        let latency = start_time.elapsed();

        self.latency_sum_us.fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        Ok(Evaluation { transformed, probability, latency })
    }

    /// Malicious probability for one vector
    pub fn score(&self, raw: &FeatureVector) -> Result<f32, RouterError> {
        self.evaluate(raw).map(|e| e.probability)
    }

    pub fn status(&self) -> PipelineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f64 / count as f64) / 1000.0 } else { 0.0 };

        PipelineStatus {
            classifier_backend: self.classifier.backend().to_string(),
            avg_latency_ms: avg,
            inference_count: count,
        }
    }
}

/// SHA-256 of an artifact file (hex)
fn fingerprint(path: &Path) -> Result<String, RouterError> {
    let bytes = std::fs::read(path).map_err(|e| RouterError::artifact(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
