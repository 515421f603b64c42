//! Core domain types for the Veloz transaction-cost engine.
//!
//! This crate provides the types shared by every pipeline stage:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `PriceLevel`, `OrderBookSnapshot`: Validated order-book state for one tick
//! - `CostBreakdown`, `TickResult`: Per-tick cost estimate delivered to consumers
//! - `TradeSide`, `MakerTaker`: Trading enums

pub mod book;
pub mod decimal;
pub mod error;
pub mod tick;

pub use book::{OrderBookSnapshot, PriceLevel, TradeHint, TradeSide, TOP_LEVELS};
pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use tick::{CostBreakdown, MakerTaker, TickResult, VolumeProvenance};
