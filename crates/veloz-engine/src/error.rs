//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] veloz_ws::WsError),

    #[error("Impact model error: {0}")]
    Impact(#[from] veloz_impact::ImpactError),

    #[error("Model error: {0}")]
    Model(#[from] veloz_models::ModelError),

    #[error("Cost error: {0}")]
    Cost(#[from] veloz_cost::CostError),

    #[error("Registry error: {0}")]
    Registry(#[from] veloz_registry::RegistryError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] veloz_telemetry::TelemetryError),

    #[error("Session task failed: {0}")]
    Join(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
