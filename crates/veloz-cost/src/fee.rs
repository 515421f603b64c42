//! Venue fee tiers.

use crate::error::CostError;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Fee tier; rates are exact decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeTier {
    Tier1,
    Tier2,
    Tier3,
}

impl FeeTier {
    pub const ALL: [FeeTier; 3] = [Self::Tier1, Self::Tier2, Self::Tier3];

    /// Fee rate as a fraction of notional.
    pub fn rate(&self) -> Decimal {
        match self {
            Self::Tier1 => Decimal::new(1, 3),
            Self::Tier2 => Decimal::new(8, 4),
            Self::Tier3 => Decimal::new(5, 4),
        }
    }

    /// `notional * rate`
    pub fn fee(&self, notional: Decimal) -> Decimal {
        notional * self.rate()
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tier1 => write!(f, "Tier 1"),
            Self::Tier2 => write!(f, "Tier 2"),
            Self::Tier3 => write!(f, "Tier 3"),
        }
    }
}

impl FromStr for FeeTier {
    type Err = CostError;

    /// Accepts "Tier 1", "tier1", "TIER_2" and similar.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "tier1" => Ok(Self::Tier1),
            "tier2" => Ok(Self::Tier2),
            "tier3" => Ok(Self::Tier3),
            _ => Err(CostError::UnknownFeeTier(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for FeeTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
