//! Per-tick cost estimate types.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decomposition of the market-impact cost, in currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub transient: f64,
    pub permanent: f64,
    pub risk: f64,
}

impl CostBreakdown {
    /// Zero-valued breakdown used when the impact model cannot be evaluated.
    pub const ZERO: Self = Self {
        transient: 0.0,
        permanent: 0.0,
        risk: 0.0,
    };

    pub fn total(&self) -> f64 {
        self.transient + self.permanent + self.risk
    }
}

/// Whether an order is expected to add (maker) or remove (taker) liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MakerTaker {
    Maker,
    Taker,
}

impl MakerTaker {
    /// Taker when the probability is at least one half.
    pub fn from_probability(taker_probability: f64) -> Self {
        if taker_probability >= 0.5 {
            Self::Taker
        } else {
            Self::Maker
        }
    }
}

impl fmt::Display for MakerTaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maker => write!(f, "Maker"),
            Self::Taker => write!(f, "Taker"),
        }
    }
}

/// Where the traded-volume feature of a slippage estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeProvenance {
    /// Fetched from the venue within the refresh window.
    Fresh,
    /// Last successfully fetched value, reused after a failed refresh.
    Stale,
    /// Configured default, substituted after a failed refresh.
    Substituted,
}

impl fmt::Display for VolumeProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => write!(f, "fresh"),
            Self::Stale => write!(f, "stale"),
            Self::Substituted => write!(f, "substituted"),
        }
    }
}

/// Result of one processing cycle, handed to consumers and then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    pub inst_id: String,
    /// Venue timestamp of the snapshot (epoch milliseconds).
    pub ts_ms: i64,
    pub slippage: f64,
    pub impact: CostBreakdown,
    /// True when the impact model fell back to a zero breakdown.
    pub impact_fallback: bool,
    pub fee: f64,
    pub net_cost: f64,
    pub maker_taker: MakerTaker,
    pub taker_probability: f64,
    pub volume: VolumeProvenance,
    pub network_latency_ms: f64,
}

impl TickResult {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.ts_ms).single()
    }
}

impl fmt::Display for TickResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self
            .timestamp()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| self.ts_ms.to_string());
        writeln!(f, "Timestamp:   {ts}")?;
        write!(f, "Slippage:    {:.2}", self.slippage)?;
        if self.volume != VolumeProvenance::Fresh {
            write!(f, " (volume {})", self.volume)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Impact:      {:.2} (transient={:.2}, perm={:.2}, risk={:.2})",
            self.impact.total(),
            self.impact.transient,
            self.impact.permanent,
            self.impact.risk
        )?;
        writeln!(f, "Fee:         {:.2}", self.fee)?;
        writeln!(f, "Net Cost:    {:.2}", self.net_cost)?;
        writeln!(f, "Maker/Taker: {}", self.maker_taker)?;
        writeln!(f, "Network Lat: {:.3} ms", self.network_latency_ms)
    }
}
