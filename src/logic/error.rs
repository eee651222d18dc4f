//! Error handling

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    /// Transformer or classifier artifact missing / unreadable (fatal at INIT)
    #[error("failed to load artifact {}: {reason}", path.display())]
    ArtifactLoad { path: PathBuf, reason: String },

    /// Replay dataset missing, unreadable or without a required column (fatal at LOADING)
    #[error("failed to load dataset {}: {reason}", path.display())]
    DatasetLoad { path: PathBuf, reason: String },

    /// Feature schema disagrees with the fitted one
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Classifier runtime failure on a single flow
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RouterError {
    pub fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        RouterError::ArtifactLoad { path: path.into(), reason: reason.to_string() }
    }

    pub fn dataset(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        RouterError::DatasetLoad { path: path.into(), reason: reason.to_string() }
    }

    /// Errors that only skip the current flow in permissive mode
    pub fn is_per_flow(&self) -> bool {
        matches!(self, RouterError::SchemaMismatch(_) | RouterError::Inference(_))
    }
}
