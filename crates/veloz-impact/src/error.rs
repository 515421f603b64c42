//! Impact solver error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImpactError {
    #[error("Invalid impact config: {0}")]
    InvalidConfig(String),

    #[error("Singular rate exponent: 2*delta - 1 = 0 (delta={delta})")]
    SingularExponent { delta: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type ImpactResult<T> = Result<T, ImpactError>;
