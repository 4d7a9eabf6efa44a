//! Error types for the competition engine

use std::time::Duration;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Main error type for the competition engine
#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Problem not found: {id}")]
    ProblemNotFound { id: String },

    #[error("Problem is closed: {id}")]
    ProblemClosed { id: String },

    #[error("Submission limit reached: {used}/{limit}")]
    SubmissionLimitExceeded { limit: usize, used: usize },

    #[error("Invalid feature selection: {0}")]
    InvalidFeatureSelection(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Unknown model type: {0}")]
    UnknownModel(String),

    #[error("Model not allowed for this problem: {model}")]
    ModelNotAllowed { model: String },

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Training diverged at epoch {epoch}: loss is not finite")]
    TrainingDiverged { epoch: usize },

    #[error("Training exceeded time limit of {limit:?}")]
    TrainingTimeout { limit: Duration },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ArenaError {
    fn from(err: serde_json::Error) -> Self {
        ArenaError::Serialization(err.to_string())
    }
}
