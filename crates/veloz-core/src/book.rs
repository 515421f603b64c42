//! Order-book snapshot types.
//!
//! A snapshot is fully replaced on every venue update and never partially
//! mutated, so a tick owns its snapshot outright.

use crate::error::{CoreError, Result};
use crate::{Price, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of levels per side used by the mid-price and depth features.
pub const TOP_LEVELS: usize = 5;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    #[default]
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// One price level of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub size: Size,
}

impl PriceLevel {
    pub fn new(price: Price, size: Size) -> Self {
        Self { price, size }
    }

    /// Price must be strictly positive, quantity non-negative.
    pub fn is_valid(&self) -> bool {
        self.price.is_positive() && !self.size.is_negative()
    }
}

/// Last-trade fields some venue messages carry alongside the book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeHint {
    pub price: Option<Price>,
    pub side: Option<TradeSide>,
    pub size: Option<Size>,
}

/// Validated order-book snapshot for one instrument.
///
/// Bids are ordered by descending price, asks by ascending price, and both
/// sides hold at least one valid level.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookSnapshot {
    pub inst_id: String,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    /// Venue timestamp (epoch milliseconds).
    pub ts_ms: i64,
    pub trade: Option<TradeHint>,
}

impl OrderBookSnapshot {
    /// Build a snapshot from raw levels.
    ///
    /// Invalid levels are dropped. Fails with `EmptySide` when either side
    /// has nothing left after filtering.
    pub fn from_levels(
        inst_id: impl Into<String>,
        mut bids: Vec<PriceLevel>,
        mut asks: Vec<PriceLevel>,
        ts_ms: i64,
    ) -> Result<Self> {
        bids.retain(PriceLevel::is_valid);
        asks.retain(PriceLevel::is_valid);

        if bids.is_empty() {
            return Err(CoreError::EmptySide("bids"));
        }
        if asks.is_empty() {
            return Err(CoreError::EmptySide("asks"));
        }

        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));

        Ok(Self {
            inst_id: inst_id.into(),
            bids,
            asks,
            ts_ms,
            trade: None,
        })
    }

    /// Attach last-trade fields.
    pub fn with_trade(mut self, trade: TradeHint) -> Self {
        self.trade = Some(trade);
        self
    }

    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    pub fn best_bid(&self) -> Price {
        self.bids[0].price
    }

    pub fn best_ask(&self) -> Price {
        self.asks[0].price
    }

    /// Best ask minus best bid (may be zero or negative on a crossed book).
    pub fn spread(&self) -> f64 {
        (self.best_ask() - self.best_bid()).as_f64()
    }

    /// Mid of the best bid and best ask.
    pub fn best_mid(&self) -> f64 {
        (self.best_bid().as_f64() + self.best_ask().as_f64()) / 2.0
    }

    /// Average of the mean top-5 bid price and the mean top-5 ask price.
    pub fn mid_price(&self) -> f64 {
        (mean_price(&self.bids) + mean_price(&self.asks)) / 2.0
    }

    /// Sum of top-5 quantities on both sides.
    pub fn depth(&self) -> f64 {
        let sum = |levels: &[PriceLevel]| {
            levels
                .iter()
                .take(TOP_LEVELS)
                .fold(Size::ZERO, |acc, l| acc + l.size)
        };
        (sum(&self.bids) + sum(&self.asks)).as_f64()
    }
}

fn mean_price(levels: &[PriceLevel]) -> f64 {
    let top = &levels[..levels.len().min(TOP_LEVELS)];
    top.iter().map(|l| l.price.as_f64()).sum::<f64>() / top.len() as f64
}
