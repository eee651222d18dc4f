//! Simulator configuration

use std::path::PathBuf;

use crate::constants::*;
use crate::logic::error::RouterError;

/// Runtime configuration of one replay run
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Fitted transformer parameters (JSON)
    pub transformer_path: PathBuf,

    /// Classifier artifact (`.onnx` or `.json`)
    pub classifier_path: PathBuf,

    /// ONNX output holding the class probabilities
    pub classifier_output: Option<String>,

    /// Replay dataset (CSV)
    pub dataset_path: PathBuf,

    /// Ground-truth column in the dataset
    pub label_column: String,

    /// Rows loaded into the replay buffer
    pub max_rows: usize,

    /// Probability at or above which a flow is blocked
    pub threshold: f32,

    /// Label value that marks benign truth (case-sensitive)
    pub benign_label: String,

    /// Inter-arrival delay range in seconds
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,

    /// Schema mismatches on a single flow become fatal
    pub strict: bool,

    /// RNG seed for reproducible replays
    pub seed: Option<u64>,

    /// Write a JSONL decision log
    pub record_decisions: bool,
    pub decision_log_dir: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            transformer_path: PathBuf::from(DEFAULT_TRANSFORMER_PATH),
            classifier_path: PathBuf::from(DEFAULT_CLASSIFIER_PATH),
            classifier_output: None,
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            max_rows: DEFAULT_MAX_ROWS,
            threshold: DEFAULT_THRESHOLD,
            benign_label: DEFAULT_BENIGN_LABEL.to_string(),
            min_delay_secs: DEFAULT_MIN_DELAY_SECS,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
            strict: false,
            seed: None,
            record_decisions: false,
            decision_log_dir: default_decision_log_dir(),
        }
    }
}

impl SimConfig {
    /// Reject settings the driver cannot run with
    pub fn validate(&self) -> Result<(), RouterError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(RouterError::Config(format!(
                "threshold must lie in [0, 1], got {}",
                self.threshold
            )));
        }

        if !self.min_delay_secs.is_finite() || !self.max_delay_secs.is_finite() {
            return Err(RouterError::Config("delay bounds must be finite".into()));
        }

        if self.min_delay_secs < 0.0 {
            return Err(RouterError::Config(format!(
                "min delay must not be negative, got {}",
                self.min_delay_secs
            )));
        }

        if self.min_delay_secs > self.max_delay_secs {
            return Err(RouterError::Config(format!(
                "min delay {}s exceeds max delay {}s",
                self.min_delay_secs, self.max_delay_secs
            )));
        }

        if self.max_rows == 0 {
            return Err(RouterError::Config("max rows must be greater than 0".into()));
        }

        if self.label_column.trim().is_empty() {
            return Err(RouterError::Config("label column must not be empty".into()));
        }

        Ok(())
    }
}
