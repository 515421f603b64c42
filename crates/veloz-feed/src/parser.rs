//! Book push parsing.
//!
//! Venue levels arrive as `[price, size, ...]` string arrays. Levels that
//! fail to parse, or carry a non-positive price or negative size, are
//! dropped; a book left with an empty side is rejected.

use crate::error::{FeedError, FeedResult};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};
use veloz_core::{OrderBookSnapshot, Price, PriceLevel, Size, TradeHint, TradeSide};
use veloz_ws::PushMessage;

/// Rejection statistics, shared across every push the parser sees.
#[derive(Debug, Default)]
pub struct RejectionStats {
    /// Pushes that could not be decoded at all.
    pub malformed_count: AtomicU64,
    /// Books rejected for an empty side after filtering.
    pub empty_side_count: AtomicU64,
    /// Individual levels dropped during filtering.
    pub dropped_level_count: AtomicU64,
    /// Books accepted.
    pub accepted_count: AtomicU64,
}

impl RejectionStats {
    pub fn malformed(&self) -> u64 {
        self.malformed_count.load(Ordering::Relaxed)
    }

    pub fn empty_side(&self) -> u64 {
        self.empty_side_count.load(Ordering::Relaxed)
    }

    pub fn dropped_levels(&self) -> u64 {
        self.dropped_level_count.load(Ordering::Relaxed)
    }

    pub fn accepted(&self) -> u64 {
        self.accepted_count.load(Ordering::Relaxed)
    }
}

/// Raw book entry inside a push's `data` array.
#[derive(Debug, Deserialize)]
struct RawBook {
    #[serde(default)]
    asks: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    bids: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    ts: Option<serde_json::Value>,
    #[serde(rename = "lastPx", default)]
    last_px: Option<String>,
    #[serde(default)]
    side: Option<String>,
    #[serde(default)]
    sz: Option<String>,
}

/// Book push parser.
#[derive(Debug, Default)]
pub struct BookParser {
    stats: RejectionStats,
}

impl BookParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &RejectionStats {
        &self.stats
    }

    /// Parse the first book of a push into a validated snapshot.
    ///
    /// Every push is treated as a complete book; incremental `update`
    /// actions are not merged.
    pub fn parse(&self, push: &PushMessage) -> FeedResult<OrderBookSnapshot> {
        let result = self.parse_inner(push);
        match &result {
            Ok(_) => {
                self.stats.accepted_count.fetch_add(1, Ordering::Relaxed);
            }
            Err(FeedError::Rejected(e)) => {
                self.stats.empty_side_count.fetch_add(1, Ordering::Relaxed);
                debug!(inst_id = %push.arg.inst_id, error = %e, "Book rejected");
            }
            Err(e) => {
                self.stats.malformed_count.fetch_add(1, Ordering::Relaxed);
                warn!(inst_id = %push.arg.inst_id, error = %e, "Malformed book push");
            }
        }
        result
    }

    fn parse_inner(&self, push: &PushMessage) -> FeedResult<OrderBookSnapshot> {
        let first = push.data.first().ok_or(FeedError::EmptyPush)?;
        let raw: RawBook = serde_json::from_value(first.clone())
            .map_err(|e| FeedError::ParseError(format!("Invalid book entry: {e}")))?;

        let ts_ms = match &raw.ts {
            Some(value) => parse_ts(value)?,
            None => return Err(FeedError::ParseError("Missing ts".to_string())),
        };

        let bids = self.parse_levels(&raw.bids);
        let asks = self.parse_levels(&raw.asks);

        let snapshot = OrderBookSnapshot::from_levels(push.arg.inst_id.clone(), bids, asks, ts_ms)?;

        let hint = trade_hint(&raw);
        let snapshot = if hint == TradeHint::default() {
            snapshot
        } else {
            snapshot.with_trade(hint)
        };

        trace!(
            inst_id = %snapshot.inst_id,
            bids = snapshot.bids().len(),
            asks = snapshot.asks().len(),
            ts_ms,
            "Parsed book"
        );

        Ok(snapshot)
    }

    fn parse_levels(&self, raw: &[Vec<serde_json::Value>]) -> Vec<PriceLevel> {
        let levels: Vec<PriceLevel> = raw
            .iter()
            .filter_map(|entry| parse_level(entry))
            .filter(PriceLevel::is_valid)
            .collect();

        let dropped = raw.len() - levels.len();
        if dropped > 0 {
            self.stats
                .dropped_level_count
                .fetch_add(dropped as u64, Ordering::Relaxed);
        }
        levels
    }
}

fn parse_level(entry: &[serde_json::Value]) -> Option<PriceLevel> {
    let price: Price = value_str(entry.first()?)?.parse().ok()?;
    let size: Size = value_str(entry.get(1)?)?.parse().ok()?;
    Some(PriceLevel::new(price, size))
}

fn value_str(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_ts(value: &serde_json::Value) -> FeedResult<i64> {
    value_str(value)
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| FeedError::ParseError(format!("Invalid ts: {value}")))
}

fn parse_side(raw: &str) -> Option<TradeSide> {
    match raw.to_ascii_lowercase().as_str() {
        "buy" | "bid" => Some(TradeSide::Buy),
        "sell" | "ask" => Some(TradeSide::Sell),
        _ => None,
    }
}

fn trade_hint(raw: &RawBook) -> TradeHint {
    TradeHint {
        price: raw
            .last_px
            .as_deref()
            .and_then(|s| s.parse::<Price>().ok())
            .filter(Price::is_positive),
        side: raw.side.as_deref().and_then(parse_side),
        size: raw
            .sz
            .as_deref()
            .and_then(|s| s.parse::<Size>().ok())
            .filter(|s| !s.is_negative()),
    }
}
