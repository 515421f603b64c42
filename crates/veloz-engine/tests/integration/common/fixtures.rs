//! Engine state and book payloads for integration tests.

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use veloz_core::TradeSide;
use veloz_cost::{CostAggregator, FeeTier, SlippageModel, VolumePolicy, VolumeResolver};
use veloz_engine::{EngineState, SessionConfig};
use veloz_impact::{ImpactModelConfig, ImpactSolver};
use veloz_models::{ClassificationService, LinearScorer, LogisticScorer, ModelArtifact};
use veloz_registry::{RegistryResult, VolumeSource};
use veloz_ws::{ConnectionConfig, SubscriptionTarget};

/// Volume source with a fixed 24h volume.
pub struct StaticVolume(pub f64);

#[async_trait]
impl VolumeSource for StaticVolume {
    async fn volume_24h(&self, _inst_id: &str) -> RegistryResult<f64> {
        Ok(self.0)
    }
}

fn artifact(coefficients: Vec<f64>, intercept: f64) -> ModelArtifact {
    ModelArtifact {
        feature_names: vec![],
        coefficients,
        intercept,
    }
}

/// In-memory models, Tier 1 fees, fixed volume.
pub fn engine_state() -> Arc<EngineState> {
    let classifier = LogisticScorer::new(artifact(vec![1.5, 2.0], -0.5));
    let regressor = LinearScorer::new(artifact(vec![50.0, -0.01, 0.0, 0.0005], 0.1));

    Arc::new(EngineState::new(
        ImpactSolver::new(ImpactModelConfig::default()).unwrap(),
        ClassificationService::new(Arc::new(classifier), TradeSide::Buy),
        CostAggregator::new(
            SlippageModel::new(Arc::new(regressor)),
            VolumeResolver::new(
                Arc::new(StaticVolume(1_000_000.0)),
                VolumePolicy::Skip,
                Duration::from_secs(60),
            ),
            FeeTier::Tier1,
        ),
    ))
}

/// Session against `url` with short timings.
pub fn session_config(url: String, reconnect_delay_ms: u64, recv_timeout_ms: u64) -> SessionConfig {
    SessionConfig {
        connection: ConnectionConfig {
            url,
            reconnect_delay_ms,
            recv_timeout_ms,
            subscription: SubscriptionTarget {
                channel: "books".to_string(),
                inst_id: "BTC-USDT".to_string(),
            },
        },
        notional: dec!(1000),
        volatility: 0.5,
        report_every: 1,
        event_capacity: 64,
    }
}

/// Book push for bids [[100,2],[99,3]] and asks [[101,1],[102,4]].
pub fn sample_book_push() -> String {
    json!({
        "arg": {"channel": "books", "instId": "BTC-USDT"},
        "action": "snapshot",
        "data": [{
            "asks": [["101", "1", "0", "1"], ["102", "4", "0", "2"]],
            "bids": [["100", "2", "0", "1"], ["99", "3", "0", "1"]],
            "ts": "1700000000000"
        }]
    })
    .to_string()
}

/// Book push with no asks.
pub fn empty_asks_push() -> String {
    json!({
        "arg": {"channel": "books", "instId": "BTC-USDT"},
        "action": "snapshot",
        "data": [{
            "asks": [],
            "bids": [["100", "2", "0", "1"]],
            "ts": "1700000000001"
        }]
    })
    .to_string()
}
