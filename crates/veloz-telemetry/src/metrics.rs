//! Prometheus metrics for Veloz.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a build defect; it can only surface
//! during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram_vec,
    CounterVec, Gauge, GaugeVec, HistogramVec,
};

const LATENCY_BUCKETS_MS: &[f64] = &[
    0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0,
];

/// WebSocket connection state (1 = connected, 0 = disconnected).
pub static WS_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "veloz_ws_connected",
        "WebSocket connection state (1=connected)"
    )
    .unwrap()
});

/// Session state machine current state.
pub static WS_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "veloz_ws_state",
        "Session state machine current state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Total reconnection attempts.
pub static WS_RECONNECT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "veloz_ws_reconnect_total",
        "Total WebSocket reconnection attempts",
        &["reason"]
    )
    .unwrap()
});

/// Ticks that produced a result.
pub static TICKS_PROCESSED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "veloz_ticks_processed_total",
        "Order-book ticks that produced a cost estimate",
        &["inst_id"]
    )
    .unwrap()
});

/// Ticks skipped before producing a result.
pub static TICKS_SKIPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "veloz_ticks_skipped_total",
        "Order-book ticks skipped without a cost estimate",
        &["inst_id", "reason"]
    )
    .unwrap()
});

/// Impact solves that fell back to a zero breakdown.
pub static SOLVER_FALLBACK_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "veloz_solver_fallback_total",
        "Impact solves replaced by a zero breakdown",
        &["inst_id"]
    )
    .unwrap()
});

/// Slippage estimates computed with a non-fresh volume.
pub static VOLUME_DEGRADED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "veloz_volume_degraded_total",
        "Slippage estimates using stale or substituted volume",
        &["inst_id", "provenance"]
    )
    .unwrap()
});

/// Processing span (solver, classification, aggregation).
pub static PROCESSING_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "veloz_processing_ms",
        "Tick processing duration in milliseconds",
        &["inst_id"],
        LATENCY_BUCKETS_MS.to_vec()
    )
    .unwrap()
});

/// Dispatch span (handing the result to consumers).
pub static DISPATCH_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "veloz_dispatch_ms",
        "Tick dispatch duration in milliseconds",
        &["inst_id"],
        LATENCY_BUCKETS_MS.to_vec()
    )
    .unwrap()
});

/// Frame receipt to dispatch complete.
pub static END_TO_END_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "veloz_end_to_end_ms",
        "Frame receipt to dispatch completion in milliseconds",
        &["inst_id"],
        LATENCY_BUCKETS_MS.to_vec()
    )
    .unwrap()
});

/// Feed parser rejections.
pub static FEED_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "veloz_feed_rejected_total",
        "Book pushes or levels rejected by the parser",
        &["kind"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record WebSocket connected.
    pub fn ws_connected() {
        WS_CONNECTED.set(1.0);
    }

    /// Record WebSocket disconnected.
    pub fn ws_disconnected() {
        WS_CONNECTED.set(0.0);
    }

    /// Mark `state` active among `all`.
    pub fn ws_state_set(state: &str, all: &[&str]) {
        for s in all {
            WS_STATE.with_label_values(&[s]).set(0.0);
        }
        WS_STATE.with_label_values(&[state]).set(1.0);
    }

    pub fn ws_reconnect(reason: &str) {
        WS_RECONNECT_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn tick_processed(inst_id: &str) {
        TICKS_PROCESSED_TOTAL.with_label_values(&[inst_id]).inc();
    }

    pub fn tick_skipped(inst_id: &str, reason: &str) {
        TICKS_SKIPPED_TOTAL
            .with_label_values(&[inst_id, reason])
            .inc();
    }

    pub fn solver_fallback(inst_id: &str) {
        SOLVER_FALLBACK_TOTAL.with_label_values(&[inst_id]).inc();
    }

    pub fn volume_degraded(inst_id: &str, provenance: &str) {
        VOLUME_DEGRADED_TOTAL
            .with_label_values(&[inst_id, provenance])
            .inc();
    }

    pub fn feed_rejected(kind: &str, count: u64) {
        if count > 0 {
            FEED_REJECTED_TOTAL
                .with_label_values(&[kind])
                .inc_by(count as f64);
        }
    }

    /// Observe one tick's spans, in milliseconds.
    pub fn tick_latency(inst_id: &str, processing_ms: f64, dispatch_ms: f64, end_to_end_ms: f64) {
        PROCESSING_MS
            .with_label_values(&[inst_id])
            .observe(processing_ms);
        DISPATCH_MS
            .with_label_values(&[inst_id])
            .observe(dispatch_ms);
        END_TO_END_MS
            .with_label_values(&[inst_id])
            .observe(end_to_end_ms);
    }
}
