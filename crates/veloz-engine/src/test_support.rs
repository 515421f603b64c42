//! Fixtures shared by the engine's unit tests.

use crate::state::EngineState;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use veloz_core::TradeSide;
use veloz_cost::{CostAggregator, FeeTier, SlippageModel, VolumePolicy, VolumeResolver};
use veloz_impact::{ImpactModelConfig, ImpactSolver};
use veloz_models::{ClassificationService, LinearScorer, LogisticScorer, ModelArtifact};
use veloz_registry::{RegistryError, RegistryResult, VolumeSource};
use veloz_ws::{PushMessage, SubscriptionArg};

/// Volume source returning a fixed value, or always failing.
pub(crate) struct StaticVolume(Option<f64>);

impl StaticVolume {
    pub(crate) fn ok(value: f64) -> Self {
        Self(Some(value))
    }

    pub(crate) fn failing() -> Self {
        Self(None)
    }
}

#[async_trait]
impl VolumeSource for StaticVolume {
    async fn volume_24h(&self, _inst_id: &str) -> RegistryResult<f64> {
        self.0
            .ok_or_else(|| RegistryError::HttpClient("unreachable".to_string()))
    }
}

fn artifact(coefficients: Vec<f64>, intercept: f64) -> ModelArtifact {
    ModelArtifact {
        feature_names: vec![],
        coefficients,
        intercept,
    }
}

/// Engine state with in-memory models, Tier 1 fees and the skip policy.
pub(crate) fn engine_state(impact: ImpactModelConfig, volume: StaticVolume) -> Arc<EngineState> {
    let classifier = LogisticScorer::new(artifact(vec![1.5, 2.0], -0.5));
    let regressor = LinearScorer::new(artifact(vec![50.0, -0.01, 0.0, 0.0005], 0.1));

    Arc::new(EngineState::new(
        ImpactSolver::new(impact).unwrap(),
        ClassificationService::new(Arc::new(classifier), TradeSide::Buy),
        CostAggregator::new(
            SlippageModel::new(Arc::new(regressor)),
            VolumeResolver::new(Arc::new(volume), VolumePolicy::Skip, Duration::ZERO),
            FeeTier::Tier1,
        ),
    ))
}

/// bids [[100,2],[99,3]], asks [[101,1],[102,4]]
pub(crate) fn sample_push() -> PushMessage {
    PushMessage {
        arg: SubscriptionArg {
            channel: "books".to_string(),
            inst_id: "BTC-USDT".to_string(),
        },
        action: Some("snapshot".to_string()),
        data: vec![json!({
            "asks": [["101", "1", "0", "1"], ["102", "4", "0", "2"]],
            "bids": [["100", "2", "0", "1"], ["99", "3", "0", "1"]],
            "ts": "1700000000000"
        })],
    }
}
