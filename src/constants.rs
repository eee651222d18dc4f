//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value here can be overridden from the command line or the environment
//! (see `src/main.rs` for the flag and variable names).

use std::path::PathBuf;

/// Default transformer artifact (fitted scaler parameters, JSON)
pub const DEFAULT_TRANSFORMER_PATH: &str = "outputs/endsem/router_scaler.json";

/// Default classifier artifact (ONNX or JSON logistic model)
pub const DEFAULT_CLASSIFIER_PATH: &str = "outputs/endsem/router_model.onnx";

/// Default replay dataset
pub const DEFAULT_DATASET_PATH: &str = "outputs/cleaned_data.csv";

/// Ground-truth label column in the replay dataset
pub const DEFAULT_LABEL_COLUMN: &str = "Label";

/// Label value that marks a flow as benign (case-sensitive)
pub const DEFAULT_BENIGN_LABEL: &str = "BENIGN";

/// Probability at or above which a flow is blocked
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Inter-arrival delay range (seconds)
pub const DEFAULT_MIN_DELAY_SECS: f64 = 0.5;
pub const DEFAULT_MAX_DELAY_SECS: f64 = 2.0;

/// Rows loaded into the replay buffer
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "flow-router-sim";

/// Exit status for a FATAL transition
pub const EXIT_FATAL: i32 = 1;

/// Exit status for a configuration rejected before INIT
pub const EXIT_CONFIG: i32 = 2;

/// Default directory for the JSONL decision log
pub fn default_decision_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("decisions")
}
