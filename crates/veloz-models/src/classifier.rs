//! Maker/taker classification.

use crate::error::ModelResult;
use crate::scorer::Scorer;
use std::sync::Arc;
use tracing::trace;
use veloz_core::{MakerTaker, OrderBookSnapshot, TradeSide};

/// Classifier inputs derived from one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MakerTakerFeatures {
    /// How far the trade price reaches into the spread, in spreads.
    pub rel_aggr: f64,
    /// Trade size over the combined top-5 depth.
    pub size_depth_ratio: f64,
}

impl MakerTakerFeatures {
    /// Derive features for a trade at `price` of `size` on `side`.
    pub fn compute(book: &OrderBookSnapshot, price: f64, side: TradeSide, size: f64) -> Self {
        let best_bid = book.best_bid().as_f64();
        let best_ask = book.best_ask().as_f64();
        let spread = best_ask - best_bid;

        let aggr = match side {
            TradeSide::Buy => price - best_bid,
            TradeSide::Sell => best_ask - price,
        };
        let rel_aggr = if spread > 0.0 { aggr / spread } else { 0.0 };

        let depth = book.depth();
        let size_depth_ratio = if depth > 0.0 { size / depth } else { 0.0 };

        Self {
            rel_aggr,
            size_depth_ratio,
        }
    }

    pub fn to_vec(self) -> [f64; 2] {
        [self.rel_aggr, self.size_depth_ratio]
    }
}

/// Output of one classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub features: MakerTakerFeatures,
    pub taker_probability: f64,
    pub label: MakerTaker,
}

/// Maker/taker classifier over a shared scorer.
#[derive(Clone)]
pub struct ClassificationService {
    scorer: Arc<dyn Scorer>,
    default_side: TradeSide,
}

impl ClassificationService {
    pub fn new(scorer: Arc<dyn Scorer>, default_side: TradeSide) -> Self {
        Self {
            scorer,
            default_side,
        }
    }

    /// Classify an order of `notional` against `book`.
    ///
    /// Trade price, side and size come from the snapshot's trade fields when
    /// present; otherwise the best ask, the configured side, and
    /// `notional / price`.
    pub async fn classify(
        &self,
        book: &OrderBookSnapshot,
        notional: f64,
    ) -> ModelResult<Classification> {
        let hint = book.trade.unwrap_or_default();

        let price = hint
            .price
            .unwrap_or_else(|| book.best_ask())
            .as_f64();
        let side = hint.side.unwrap_or(self.default_side);
        let size = match hint.size {
            Some(size) => size.as_f64(),
            None if price > 0.0 => notional / price,
            None => 0.0,
        };

        let features = MakerTakerFeatures::compute(book, price, side, size);
        let taker_probability = self.scorer.score(&features.to_vec()).await?;
        let label = MakerTaker::from_probability(taker_probability);

        trace!(
            rel_aggr = features.rel_aggr,
            size_depth_ratio = features.size_depth_ratio,
            taker_probability,
            %label,
            "Classified"
        );

        Ok(Classification {
            features,
            taker_probability,
            label,
        })
    }
}
