//! Registry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Venue error {code}: {msg}")]
    Api { code: String, msg: String },

    #[error("Field missing from response: {0}")]
    MissingField(&'static str),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
