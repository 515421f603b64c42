//! Events published to session consumers.

use std::time::Instant;
use veloz_core::TickResult;
use veloz_telemetry::LatencyReport;

/// One item on a session's broadcast channel.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A completed cost estimate.
    Tick(TickResult),
    /// Connection established (`true`) or lost (`false`).
    Connectivity { connected: bool, at: Instant },
    /// Periodic latency summary.
    Latency(LatencyReport),
}

impl EngineEvent {
    pub fn connectivity(connected: bool) -> Self {
        Self::Connectivity {
            connected,
            at: Instant::now(),
        }
    }
}
