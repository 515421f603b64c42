//! Application configuration.

use crate::error::{AppError, AppResult};
use crate::session::SessionConfig;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use veloz_core::TradeSide;
use veloz_impact::ImpactModelConfig;
use veloz_models::ScorerSource;
use veloz_registry::DEFAULT_REST_URL;
use veloz_ws::{ConnectionConfig, SubscriptionTarget};

/// Default config path when neither `--config` nor `VELOZ_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// The simulated order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderConfig {
    /// Instrument identifier (e.g., "BTC-USDT").
    #[serde(default = "default_instrument")]
    pub instrument: String,
    /// Order size in quote currency.
    #[serde(default = "default_notional_usd")]
    pub notional_usd: Decimal,
    /// Fee tier label ("Tier 1", "Tier 2", "Tier 3").
    #[serde(default = "default_fee_tier")]
    pub fee_tier: String,
    /// Volatility fed to the impact model's risk term.
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    /// Side assumed when the feed carries no trade side.
    #[serde(default)]
    pub side: TradeSide,
}

fn default_instrument() -> String {
    "BTC-USDT".to_string()
}

fn default_notional_usd() -> Decimal {
    Decimal::new(100, 0)
}

fn default_fee_tier() -> String {
    "Tier 1".to_string()
}

fn default_volatility() -> f64 {
    0.5
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            instrument: default_instrument(),
            notional_usd: default_notional_usd(),
            fee_tier: default_fee_tier(),
            volatility: default_volatility(),
            side: TradeSide::default(),
        }
    }
}

/// WebSocket configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WsConfig {
    /// Fixed delay between reconnection attempts (ms).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Receive timeout after which the loop treats the feed as idle (ms).
    #[serde(default = "default_recv_timeout_ms")]
    pub recv_timeout_ms: u64,
    /// Book channel ("books", "books5", ...).
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_recv_timeout_ms() -> u64 {
    5000
}

fn default_channel() -> String {
    "books".to_string()
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            recv_timeout_ms: default_recv_timeout_ms(),
            channel: default_channel(),
        }
    }
}

/// Model sources.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Maker/taker classifier (logistic, 2 features).
    #[serde(default = "default_classifier")]
    pub classifier: ScorerSource,
    /// Slippage regressor (linear, 4 features).
    #[serde(default = "default_regressor")]
    pub regressor: ScorerSource,
}

fn default_classifier() -> ScorerSource {
    ScorerSource::Artifact {
        path: PathBuf::from("config/models/maker_taker.json"),
    }
}

fn default_regressor() -> ScorerSource {
    ScorerSource::Artifact {
        path: PathBuf::from("config/models/slippage.json"),
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            classifier: default_classifier(),
            regressor: default_regressor(),
        }
    }
}

/// Recent-volume lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeConfig {
    /// Failure policy: "skip", "default" or "last_known".
    #[serde(default = "default_volume_policy")]
    pub policy: String,
    /// Value substituted under the "default" policy.
    #[serde(default)]
    pub default_value: Option<f64>,
    /// Cache window during which a fetched value counts as fresh (ms).
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
    /// REST request timeout (ms).
    #[serde(default = "default_volume_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_volume_policy() -> String {
    "skip".to_string()
}

fn default_refresh_ms() -> u64 {
    5000
}

fn default_volume_timeout_ms() -> u64 {
    2000
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            policy: default_volume_policy(),
            default_value: None,
            refresh_ms: default_refresh_ms(),
            timeout_ms: default_volume_timeout_ms(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_level: Option<String>,
    /// Accepted ticks between latency reports.
    #[serde(default = "default_report_every")]
    pub report_every: u64,
    /// Capacity of each session's event channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_report_every() -> u64 {
    100
}

fn default_event_capacity() -> usize {
    1024
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            report_every: default_report_every(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// WebSocket endpoint URL.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// REST base URL for tickers and instruments.
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    #[serde(default)]
    pub order: OrderConfig,
    #[serde(default)]
    pub impact: ImpactModelConfig,
    #[serde(default)]
    pub websocket: WsConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub volume: VolumeConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_ws_url() -> String {
    ConnectionConfig::default().url
}

fn default_rest_url() -> String {
    DEFAULT_REST_URL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            rest_url: default_rest_url(),
            order: OrderConfig::default(),
            impact: ImpactModelConfig::default(),
            websocket: WsConfig::default(),
            models: ModelsConfig::default(),
            volume: VolumeConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve the config path: explicit path > `VELOZ_CONFIG` > default.
    pub fn resolve_path(explicit: Option<String>) -> String {
        explicit
            .or_else(|| std::env::var("VELOZ_CONFIG").ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks on values not owned by a component. Impact parameters, fee
    /// tier, volume policy and model artifacts are checked when the engine
    /// state is built.
    pub fn validate(&self) -> AppResult<()> {
        if self.order.instrument.trim().is_empty() {
            return Err(AppError::Config("order.instrument is empty".to_string()));
        }
        if self.order.notional_usd <= Decimal::ZERO {
            return Err(AppError::Config(format!(
                "order.notional_usd must be > 0, got {}",
                self.order.notional_usd
            )));
        }
        if !(self.order.volatility >= 0.0 && self.order.volatility.is_finite()) {
            return Err(AppError::Config(format!(
                "order.volatility must be >= 0, got {}",
                self.order.volatility
            )));
        }
        if self.websocket.recv_timeout_ms == 0 {
            return Err(AppError::Config(
                "websocket.recv_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.telemetry.report_every == 0 {
            return Err(AppError::Config(
                "telemetry.report_every must be >= 1".to_string(),
            ));
        }
        if self.telemetry.event_capacity == 0 {
            return Err(AppError::Config(
                "telemetry.event_capacity must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Connection settings for one instrument.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            url: self.ws_url.clone(),
            reconnect_delay_ms: self.websocket.reconnect_delay_ms,
            recv_timeout_ms: self.websocket.recv_timeout_ms,
            subscription: SubscriptionTarget {
                channel: self.websocket.channel.clone(),
                inst_id: self.order.instrument.clone(),
            },
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            connection: self.connection_config(),
            notional: self.order.notional_usd,
            volatility: self.order.volatility,
            report_every: self.telemetry.report_every,
            event_capacity: self.telemetry.event_capacity,
        }
    }
}
