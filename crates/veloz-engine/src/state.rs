//! Engine state built once at start-up and shared read-only by sessions.

use crate::config::AppConfig;
use crate::error::AppResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use veloz_cost::{CostAggregator, FeeTier, SlippageModel, VolumePolicy, VolumeResolver};
use veloz_impact::ImpactSolver;
use veloz_models::{
    build_scorer, ClassificationService, ScorerKind, CLASSIFIER_FEATURES, REGRESSOR_FEATURES,
};
use veloz_registry::MarketClient;

/// Solver, classifier and aggregator for every session.
pub struct EngineState {
    pub solver: ImpactSolver,
    pub classifier: ClassificationService,
    pub aggregator: CostAggregator,
}

impl EngineState {
    pub fn new(
        solver: ImpactSolver,
        classifier: ClassificationService,
        aggregator: CostAggregator,
    ) -> Self {
        Self {
            solver,
            classifier,
            aggregator,
        }
    }

    /// Build from configuration, loading model artifacts.
    ///
    /// Any invalid static setting fails here, before a session starts.
    pub fn from_config(config: &AppConfig) -> AppResult<Arc<Self>> {
        let solver = ImpactSolver::new(config.impact.clone())?;

        let classifier_scorer = build_scorer(
            &config.models.classifier,
            ScorerKind::Logistic,
            CLASSIFIER_FEATURES,
        )?;
        let regressor = build_scorer(
            &config.models.regressor,
            ScorerKind::Linear,
            REGRESSOR_FEATURES,
        )?;

        let fee_tier: FeeTier = config.order.fee_tier.parse()?;
        let policy = VolumePolicy::from_config(&config.volume.policy, config.volume.default_value)?;
        let client = MarketClient::with_timeout(
            config.rest_url.clone(),
            Duration::from_millis(config.volume.timeout_ms),
        )?;
        let volume = VolumeResolver::new(
            Arc::new(client),
            policy,
            Duration::from_millis(config.volume.refresh_ms),
        );

        info!(
            classifier = %classifier_scorer.describe(),
            regressor = %regressor.describe(),
            %fee_tier,
            ?policy,
            delta = config.impact.delta,
            steps = config.impact.steps,
            "Engine state built"
        );

        Ok(Arc::new(Self::new(
            solver,
            ClassificationService::new(classifier_scorer, config.order.side),
            CostAggregator::new(SlippageModel::new(regressor), volume, fee_tier),
        )))
    }
}
