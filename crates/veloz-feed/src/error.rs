//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Push carried no data entries")]
    EmptyPush,

    #[error("Book rejected: {0}")]
    Rejected(#[from] veloz_core::CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeedError {
    /// Short label used as the skip reason in metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Rejected(veloz_core::CoreError::EmptySide(_)) => "empty_side",
            _ => "malformed",
        }
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
