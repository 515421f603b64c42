//! Venue REST metadata for Veloz.
//!
//! Instrument discovery and the recent-volume lookup used by the slippage
//! model.

pub mod client;
pub mod error;

pub use client::{MarketClient, VolumeSource, DEFAULT_REST_URL};
pub use error::{RegistryError, RegistryResult};
