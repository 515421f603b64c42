//! Per-tick processing: parse, solve, classify, aggregate, dispatch.

use crate::event::EngineEvent;
use crate::state::EngineState;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use veloz_core::{CostBreakdown, TickResult, VolumeProvenance};
use veloz_feed::BookParser;
use veloz_telemetry::{as_ms, LatencyTracker, Metrics};
use veloz_ws::PushMessage;

/// Processes one session's pushes in arrival order.
pub struct TickPipeline {
    state: Arc<EngineState>,
    parser: BookParser,
    tracker: LatencyTracker,
    events: broadcast::Sender<EngineEvent>,
    notional: Decimal,
    volatility: f64,
}

impl TickPipeline {
    pub fn new(
        state: Arc<EngineState>,
        tracker: LatencyTracker,
        events: broadcast::Sender<EngineEvent>,
        notional: Decimal,
        volatility: f64,
    ) -> Self {
        Self {
            state,
            parser: BookParser::new(),
            tracker,
            events,
            notional,
            volatility,
        }
    }

    pub fn tracker(&self) -> &LatencyTracker {
        &self.tracker
    }

    pub fn parser(&self) -> &BookParser {
        &self.parser
    }

    /// Handle one push received at `received_at` after waiting `waited`.
    ///
    /// Returns the dispatched result, or `None` when the tick was skipped.
    /// Skipped ticks leave the latency window untouched.
    pub async fn on_push(
        &mut self,
        push: &PushMessage,
        received_at: Instant,
        waited: Duration,
    ) -> Option<TickResult> {
        let inst_id = push.arg.inst_id.as_str();

        let dropped_before = self.parser.stats().dropped_levels();
        let parsed = self.parser.parse(push);
        Metrics::feed_rejected(
            "dropped_level",
            self.parser.stats().dropped_levels() - dropped_before,
        );
        let book = match parsed {
            Ok(book) => book,
            Err(e) => {
                Metrics::feed_rejected(e.reason(), 1);
                Metrics::tick_skipped(inst_id, e.reason());
                return None;
            }
        };

        let processing_start = Instant::now();
        let notional = self.notional.to_f64().unwrap_or(0.0);

        let (impact, impact_fallback) =
            match self.state.solver.solve(&book, notional, self.volatility) {
                Ok(report) => (report.breakdown, false),
                Err(e) => {
                    warn!(inst_id, error = %e, "Impact solve failed, using zero breakdown");
                    Metrics::solver_fallback(inst_id);
                    (CostBreakdown::ZERO, true)
                }
            };

        let classification = match self.state.classifier.classify(&book, notional).await {
            Ok(c) => c,
            Err(e) => {
                warn!(inst_id, error = %e, "Classification failed, skipping tick");
                Metrics::tick_skipped(inst_id, "classifier");
                return None;
            }
        };

        let cost = match self
            .state
            .aggregator
            .estimate(&book, self.notional, &impact)
            .await
        {
            Ok(cost) => cost,
            Err(e) => {
                warn!(inst_id, error = %e, "Cost estimate failed, skipping tick");
                Metrics::tick_skipped(inst_id, e.reason());
                return None;
            }
        };

        let processing = processing_start.elapsed();

        if cost.volume != VolumeProvenance::Fresh {
            Metrics::volume_degraded(inst_id, &cost.volume.to_string());
        }

        let tick = TickResult {
            inst_id: book.inst_id.clone(),
            ts_ms: book.ts_ms,
            slippage: cost.slippage,
            impact,
            impact_fallback,
            fee: cost.fee,
            net_cost: cost.net_cost,
            maker_taker: classification.label,
            taker_probability: classification.taker_probability,
            volume: cost.volume,
            network_latency_ms: as_ms(waited),
        };

        let dispatch_start = Instant::now();
        if self.events.send(EngineEvent::Tick(tick.clone())).is_err() {
            debug!(inst_id, "No subscribers for tick");
        }
        let dispatch = dispatch_start.elapsed();
        let end_to_end = received_at.elapsed();

        Metrics::tick_processed(inst_id);
        Metrics::tick_latency(inst_id, as_ms(processing), as_ms(dispatch), as_ms(end_to_end));
        debug!(
            inst_id,
            processing_ms = as_ms(processing),
            dispatch_ms = as_ms(dispatch),
            end_to_end_ms = as_ms(end_to_end),
            "Tick latency"
        );

        if let Some(report) = self.tracker.record(received_at, processing, dispatch) {
            info!(inst_id, %report, "Latency report");
            let _ = self.events.send(EngineEvent::Latency(report));
        }

        Some(tick)
    }
}
