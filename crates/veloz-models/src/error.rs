//! Model error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Feature count mismatch: expected {expected}, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Invalid score: {0}")]
    InvalidScore(f64),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
