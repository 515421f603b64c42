//! Net cost aggregation.

use crate::error::CostResult;
use crate::fee::FeeTier;
use crate::slippage::{SlippageFeatures, SlippageModel};
use crate::volume::VolumeResolver;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::trace;
use veloz_core::{CostBreakdown, OrderBookSnapshot, VolumeProvenance};

/// Cost components for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub slippage: f64,
    pub fee: f64,
    /// `slippage + impact.total() + fee`
    pub net_cost: f64,
    pub volume: VolumeProvenance,
    pub features: SlippageFeatures,
}

/// Combines fee, slippage and impact.
pub struct CostAggregator {
    slippage: SlippageModel,
    volume: VolumeResolver,
    fee_tier: FeeTier,
}

impl CostAggregator {
    pub fn new(slippage: SlippageModel, volume: VolumeResolver, fee_tier: FeeTier) -> Self {
        Self {
            slippage,
            volume,
            fee_tier,
        }
    }

    /// Fee in exact decimal, reported as `f64`.
    pub fn fee(&self, notional: Decimal) -> f64 {
        self.fee_tier.fee(notional).to_f64().unwrap_or(0.0)
    }

    pub async fn estimate(
        &self,
        book: &OrderBookSnapshot,
        notional: Decimal,
        impact: &CostBreakdown,
    ) -> CostResult<CostEstimate> {
        let volume = self.volume.resolve(&book.inst_id).await?;
        let notional_f64 = notional.to_f64().unwrap_or(0.0);

        let features = SlippageFeatures::compute(book, volume.value, notional_f64);
        let slippage = self.slippage.estimate(&features).await?;
        let fee = self.fee(notional);
        let net_cost = slippage + impact.total() + fee;

        trace!(
            inst_id = %book.inst_id,
            slippage,
            fee,
            net_cost,
            volume = %volume.provenance,
            "Cost aggregated"
        );

        Ok(CostEstimate {
            slippage,
            fee,
            net_cost,
            volume: volume.provenance,
            features,
        })
    }
}
