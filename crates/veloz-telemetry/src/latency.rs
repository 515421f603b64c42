//! Per-session latency window and percentile reports.
//!
//! Samples accumulate in three bounded buffers. Every `report_every`
//! accepted ticks a report is computed from whatever the buffers hold and
//! the buffers are cleared, so consecutive reports never share samples.

use crate::error::{TelemetryError, TelemetryResult};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Capacity of each latency buffer.
pub const WINDOW_CAPACITY: usize = 100;

/// Durations measured for one accepted tick, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySample {
    /// Since the previous accepted tick; zero for the first.
    pub arrival_gap_ms: f64,
    pub processing_ms: f64,
    pub dispatch_ms: f64,
}

/// Three bounded FIFO buffers; the oldest sample is dropped when full.
#[derive(Debug, Clone)]
pub struct LatencyWindow {
    arrival: VecDeque<f64>,
    processing: VecDeque<f64>,
    dispatch: VecDeque<f64>,
    capacity: usize,
}

impl Default for LatencyWindow {
    fn default() -> Self {
        Self::new(WINDOW_CAPACITY)
    }
}

impl LatencyWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            arrival: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
            dispatch: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: LatencySample) {
        push_bounded(&mut self.arrival, sample.arrival_gap_ms, self.capacity);
        push_bounded(&mut self.processing, sample.processing_ms, self.capacity);
        push_bounded(&mut self.dispatch, sample.dispatch_ms, self.capacity);
    }

    /// Number of samples held (all three buffers move together).
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    pub fn clear(&mut self) {
        self.arrival.clear();
        self.processing.clear();
        self.dispatch.clear();
    }

    pub fn arrival(&self) -> &VecDeque<f64> {
        &self.arrival
    }

    pub fn processing(&self) -> &VecDeque<f64> {
        &self.processing
    }

    pub fn dispatch(&self) -> &VecDeque<f64> {
        &self.dispatch
    }
}

fn push_bounded(buf: &mut VecDeque<f64>, value: f64, capacity: usize) {
    if buf.len() == capacity {
        buf.pop_front();
    }
    buf.push_back(value);
}

/// Median and 99th percentile of one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p99: f64,
}

impl Percentiles {
    /// Median averages the two middle values on even counts; p99 is the
    /// sorted element at `floor(len * 0.99)`.
    pub fn compute(values: &VecDeque<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = values.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let p50 = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let idx = ((n as f64 * 0.99).floor() as usize).min(n - 1);

        Some(Self {
            p50,
            p99: sorted[idx],
        })
    }
}

/// Periodic latency summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyReport {
    /// Samples the report was computed from.
    pub samples: usize,
    /// Accepted ticks since the session started.
    pub total_ticks: u64,
    pub arrival_ms: Percentiles,
    pub processing_ms: Percentiles,
    pub dispatch_ms: Percentiles,
}

impl fmt::Display for LatencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processing p50={:.3}ms p99={:.3}ms | Dispatch p50={:.3}ms p99={:.3}ms | Arrival p50={:.3}ms p99={:.3}ms ({} samples)",
            self.processing_ms.p50,
            self.processing_ms.p99,
            self.dispatch_ms.p50,
            self.dispatch_ms.p99,
            self.arrival_ms.p50,
            self.arrival_ms.p99,
            self.samples
        )
    }
}

/// Owns one session's window and report cadence.
#[derive(Debug)]
pub struct LatencyTracker {
    window: LatencyWindow,
    report_every: u64,
    total_ticks: u64,
    last_arrival: Option<Instant>,
}

impl LatencyTracker {
    pub fn new(report_every: u64) -> TelemetryResult<Self> {
        if report_every == 0 {
            return Err(TelemetryError::InvalidConfig(
                "report_every must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            window: LatencyWindow::default(),
            report_every,
            total_ticks: 0,
            last_arrival: None,
        })
    }

    pub fn window(&self) -> &LatencyWindow {
        &self.window
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Record an accepted tick that arrived at `arrived_at`.
    ///
    /// Returns a report, and clears the window, on every `report_every`-th
    /// tick.
    pub fn record(
        &mut self,
        arrived_at: Instant,
        processing: Duration,
        dispatch: Duration,
    ) -> Option<LatencyReport> {
        let arrival_gap = self
            .last_arrival
            .map(|prev| arrived_at.saturating_duration_since(prev))
            .unwrap_or(Duration::ZERO);
        self.last_arrival = Some(arrived_at);

        self.window.push(LatencySample {
            arrival_gap_ms: as_ms(arrival_gap),
            processing_ms: as_ms(processing),
            dispatch_ms: as_ms(dispatch),
        });
        self.total_ticks += 1;

        if self.total_ticks % self.report_every != 0 {
            return None;
        }

        let report = self.report();
        self.window.clear();
        report
    }

    /// Report over the current window without clearing it.
    pub fn report(&self) -> Option<LatencyReport> {
        Some(LatencyReport {
            samples: self.window.len(),
            total_ticks: self.total_ticks,
            arrival_ms: Percentiles::compute(self.window.arrival())?,
            processing_ms: Percentiles::compute(self.window.processing())?,
            dispatch_ms: Percentiles::compute(self.window.dispatch())?,
        })
    }
}

pub fn as_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut window = LatencyWindow::new(3);
        for i in 0..10 {
            window.push(LatencySample {
                arrival_gap_ms: i as f64,
                processing_ms: i as f64,
                dispatch_ms: i as f64,
            });
            assert!(window.len() <= 3);
        }
        assert_eq!(window.processing().iter().copied().collect::<Vec<_>>(), vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_percentiles() {
        let values: VecDeque<f64> = (1..=100).map(|v| v as f64).collect();
        let p = Percentiles::compute(&values).unwrap();
        assert_eq!(p.p50, 50.5);
        assert_eq!(p.p99, 100.0);

        let odd: VecDeque<f64> = [3.0, 1.0, 2.0].into_iter().collect();
        let p = Percentiles::compute(&odd).unwrap();
        assert_eq!(p.p50, 2.0);
        assert_eq!(p.p99, 3.0);

        assert!(Percentiles::compute(&VecDeque::new()).is_none());
    }

    #[test]
    fn test_report_every_hundred_then_clear() {
        let mut tracker = LatencyTracker::new(100).unwrap();
        let start = Instant::now();

        for i in 0..99 {
            let at = start + ms(i * 10);
            assert!(tracker.record(at, ms(1), ms(0)).is_none());
            assert!(tracker.window().len() <= WINDOW_CAPACITY);
        }

        let report = tracker
            .record(start + ms(990), ms(2), ms(0))
            .expect("100th tick reports");
        assert_eq!(report.samples, 100);
        assert_eq!(report.total_ticks, 100);
        assert_eq!(report.processing_ms.p99, 2.0);
        assert!((report.arrival_ms.p50 - 10.0).abs() < 1e-9);
        assert!(tracker.window().is_empty());

        assert!(tracker.record(start + ms(1000), ms(1), ms(0)).is_none());
        assert_eq!(tracker.window().len(), 1);
    }

    #[test]
    fn test_first_arrival_gap_is_zero() {
        let mut tracker = LatencyTracker::new(1).unwrap();
        let report = tracker.record(Instant::now(), ms(1), ms(1)).unwrap();
        assert_eq!(report.arrival_ms.p50, 0.0);
    }

    #[test]
    fn test_zero_cadence_rejected() {
        assert!(LatencyTracker::new(0).is_err());
    }

    #[test]
    fn test_report_display() {
        let mut tracker = LatencyTracker::new(1).unwrap();
        let report = tracker.record(Instant::now(), ms(1), ms(0)).unwrap();
        assert!(report.to_string().starts_with("Processing p50=1.000ms"));
    }
}
