//! Regression slippage estimate.

use crate::error::CostResult;
use std::sync::Arc;
use veloz_core::OrderBookSnapshot;
use veloz_models::Scorer;

/// Regressor inputs, in model order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlippageFeatures {
    /// Best-level spread over the best-level mid.
    pub relative_spread: f64,
    /// Combined top-5 quantity.
    pub depth: f64,
    /// Recent traded volume.
    pub volume_24h: f64,
    /// Order notional.
    pub notional: f64,
}

impl SlippageFeatures {
    pub fn compute(book: &OrderBookSnapshot, volume_24h: f64, notional: f64) -> Self {
        let mid = book.best_mid();
        let relative_spread = if mid > 0.0 { book.spread() / mid } else { 0.0 };
        Self {
            relative_spread,
            depth: book.depth(),
            volume_24h,
            notional,
        }
    }

    pub fn to_vec(self) -> [f64; 4] {
        [self.relative_spread, self.depth, self.volume_24h, self.notional]
    }
}

/// Slippage regressor over a shared scorer.
#[derive(Clone)]
pub struct SlippageModel {
    scorer: Arc<dyn Scorer>,
}

impl SlippageModel {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    pub async fn estimate(&self, features: &SlippageFeatures) -> CostResult<f64> {
        Ok(self.scorer.score(&features.to_vec()).await?)
    }
}
