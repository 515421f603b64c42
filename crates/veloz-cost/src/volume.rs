//! Recent traded volume with an explicit failure policy.
//!
//! Values are cached per instrument for a refresh window. Within the window
//! the cached value counts as fresh; after it a refetch is attempted, and a
//! failed refetch is resolved by the configured [`VolumePolicy`].

use crate::error::{CostError, CostResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use veloz_core::VolumeProvenance;
use veloz_registry::VolumeSource;

/// What to do when the volume fetch fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumePolicy {
    /// Skip the tick.
    Skip,
    /// Substitute a fixed value.
    Default(f64),
    /// Reuse the last fetched value; skip when there is none.
    LastKnown,
}

impl VolumePolicy {
    /// Build from the config's policy name and default value.
    pub fn from_config(name: &str, default_value: Option<f64>) -> CostResult<Self> {
        match name {
            "skip" => Ok(Self::Skip),
            "last_known" => Ok(Self::LastKnown),
            "default" => match default_value {
                Some(v) if v >= 0.0 && v.is_finite() => Ok(Self::Default(v)),
                Some(v) => Err(CostError::InvalidConfig(format!(
                    "volume default_value must be >= 0, got {v}"
                ))),
                None => Err(CostError::InvalidConfig(
                    "volume policy 'default' requires default_value".to_string(),
                )),
            },
            other => Err(CostError::InvalidConfig(format!(
                "unknown volume policy '{other}' (expected skip, default, last_known)"
            ))),
        }
    }
}

/// A volume value and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedVolume {
    pub value: f64,
    pub provenance: VolumeProvenance,
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    value: f64,
    fetched_at: Instant,
}

/// Volume lookup with caching and failure policy.
pub struct VolumeResolver {
    source: Arc<dyn VolumeSource>,
    policy: VolumePolicy,
    refresh: Duration,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl VolumeResolver {
    pub fn new(source: Arc<dyn VolumeSource>, policy: VolumePolicy, refresh: Duration) -> Self {
        Self {
            source,
            policy,
            refresh,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the 24h volume for `inst_id`.
    ///
    /// Fails with `VolumeUnavailable` only when the policy says to skip.
    pub async fn resolve(&self, inst_id: &str) -> CostResult<ResolvedVolume> {
        let cached = self.cache.lock().get(inst_id).copied();

        if let Some(entry) = cached {
            if entry.fetched_at.elapsed() < self.refresh {
                return Ok(ResolvedVolume {
                    value: entry.value,
                    provenance: VolumeProvenance::Fresh,
                });
            }
        }

        match self.source.volume_24h(inst_id).await {
            Ok(value) => {
                self.cache.lock().insert(
                    inst_id.to_string(),
                    CacheEntry {
                        value,
                        fetched_at: Instant::now(),
                    },
                );
                debug!(inst_id, value, "Volume refreshed");
                Ok(ResolvedVolume {
                    value,
                    provenance: VolumeProvenance::Fresh,
                })
            }
            Err(e) => {
                warn!(inst_id, error = %e, policy = ?self.policy, "Volume fetch failed");
                let unavailable = || CostError::VolumeUnavailable {
                    inst_id: inst_id.to_string(),
                    reason: e.to_string(),
                };
                match self.policy {
                    VolumePolicy::Skip => Err(unavailable()),
                    VolumePolicy::Default(value) => Ok(ResolvedVolume {
                        value,
                        provenance: VolumeProvenance::Substituted,
                    }),
                    VolumePolicy::LastKnown => match cached {
                        Some(entry) => Ok(ResolvedVolume {
                            value: entry.value,
                            provenance: VolumeProvenance::Stale,
                        }),
                        None => Err(unavailable()),
                    },
                }
            }
        }
    }
}
