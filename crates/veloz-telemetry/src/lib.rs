//! Latency tracking, Prometheus metrics and structured logging for Veloz.
//!
//! - Per-session latency window with periodic percentile reports
//! - Prometheus metrics for connectivity, tick outcomes and latency
//! - Structured logging with tracing

pub mod error;
pub mod latency;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use latency::{
    as_ms, LatencyReport, LatencySample, LatencyTracker, LatencyWindow, Percentiles,
    WINDOW_CAPACITY,
};
pub use logging::init_logging;
pub use metrics::Metrics;
