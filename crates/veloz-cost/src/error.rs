//! Cost aggregation error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CostError {
    #[error("Unknown fee tier: {0}")]
    UnknownFeeTier(String),

    #[error("Recent volume unavailable for {inst_id}: {reason}")]
    VolumeUnavailable { inst_id: String, reason: String },

    #[error("Invalid cost config: {0}")]
    InvalidConfig(String),

    #[error("Model error: {0}")]
    Model(#[from] veloz_models::ModelError),
}

impl CostError {
    /// Short label used as the skip reason in metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::VolumeUnavailable { .. } => "volume_unavailable",
            Self::Model(_) => "slippage_model",
            _ => "cost",
        }
    }
}

pub type CostResult<T> = Result<T, CostError>;
