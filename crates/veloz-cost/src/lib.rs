//! Transaction-cost aggregation for Veloz.
//!
//! Combines the venue fee, the regression slippage estimate and a solved
//! impact breakdown into one net cost per tick.

pub mod aggregator;
pub mod error;
pub mod fee;
pub mod slippage;
pub mod volume;

pub use aggregator::{CostAggregator, CostEstimate};
pub use error::{CostError, CostResult};
pub use fee::FeeTier;
pub use slippage::{SlippageFeatures, SlippageModel};
pub use volume::{ResolvedVolume, VolumePolicy, VolumeResolver};
