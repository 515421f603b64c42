//! Streaming session: connection lifecycle around the tick pipeline.
//!
//! ```text
//! Disconnected -> Connecting -> Subscribed -> Streaming
//!                     ^                          |
//!                     +------- Backoff <---------+ (error)
//! any state -> Stopped (stop request)
//! ```

use crate::error::{AppError, AppResult};
use crate::event::EngineEvent;
use crate::pipeline::TickPipeline;
use crate::state::EngineState;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;
use veloz_telemetry::{LatencyTracker, Metrics};
use veloz_ws::{ConnectionConfig, ConnectionManager, ConnectionState, FeedStream, Received, WsError};

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub connection: ConnectionConfig,
    /// Order notional in quote currency.
    pub notional: Decimal,
    pub volatility: f64,
    /// Accepted ticks between latency reports.
    pub report_every: u64,
    /// Broadcast channel capacity.
    pub event_capacity: usize,
}

/// A session that has not started yet. Subscribe before [`Session::spawn`]
/// to observe every event.
pub struct Session {
    id: Uuid,
    manager: ConnectionManager,
    pipeline: TickPipeline,
    events: broadcast::Sender<EngineEvent>,
    token: CancellationToken,
}

impl Session {
    pub fn new(state: Arc<EngineState>, config: SessionConfig) -> AppResult<Self> {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let token = CancellationToken::new();
        let tracker = LatencyTracker::new(config.report_every)?;

        Ok(Self {
            id: Uuid::new_v4(),
            manager: ConnectionManager::new(config.connection, token.clone()),
            pipeline: TickPipeline::new(
                state,
                tracker,
                events.clone(),
                config.notional,
                config.volatility,
            ),
            events,
            token,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Start the session task.
    pub fn spawn(self) -> SessionHandle {
        let handle_state = self.manager.state_handle();
        let span = tracing::info_span!(
            "session",
            id = %self.id,
            inst_id = %self.manager.config().subscription.inst_id
        );

        let id = self.id;
        let events = self.events.clone();
        let token = self.token.clone();
        let task = tokio::spawn(self.run().instrument(span));

        SessionHandle {
            id,
            token,
            state: handle_state,
            events,
            task,
        }
    }

    async fn run(mut self) {
        info!("Session started");
        let mut connected = false;

        loop {
            publish_state(&self.manager);

            match self.manager.open().await {
                Ok(mut stream) => {
                    connected = true;
                    self.emit_connectivity(true);
                    publish_state(&self.manager);

                    match self.stream(&mut stream).await {
                        Ok(()) => break,
                        Err(e) => {
                            warn!(error = %e, "Stream failed");
                            connected = false;
                            self.emit_connectivity(false);
                            Metrics::ws_reconnect(failure_reason(&e));
                        }
                    }
                }
                Err(WsError::Shutdown) => break,
                Err(e) => {
                    warn!(error = %e, "Connect failed");
                    self.emit_connectivity(false);
                    Metrics::ws_reconnect(failure_reason(&e));
                }
            }

            publish_label(ConnectionState::Backoff);
            if !self.manager.backoff().await {
                break;
            }
        }

        if connected {
            self.emit_connectivity(false);
        }
        self.manager.mark_stopped();
        publish_state(&self.manager);
        info!("Session stopped");
    }

    /// Pump pushes through the pipeline until shutdown (`Ok`) or failure.
    async fn stream(&mut self, stream: &mut FeedStream) -> Result<(), WsError> {
        let mut published = self.manager.state();
        loop {
            let received = stream.recv().await?;
            let received_at = Instant::now();

            let current = self.manager.state();
            if current != published {
                published = current;
                publish_label(current);
            }

            match received {
                Received::Push { message, waited } => {
                    self.pipeline.on_push(&message, received_at, waited).await;
                }
                Received::Idle => {
                    debug!("No new data within receive timeout");
                }
                Received::Shutdown => return Ok(()),
            }
        }
    }

    fn emit_connectivity(&self, connected: bool) {
        if connected {
            Metrics::ws_connected();
        } else {
            Metrics::ws_disconnected();
        }
        let _ = self.events.send(EngineEvent::connectivity(connected));
    }
}

fn publish_state(manager: &ConnectionManager) {
    publish_label(manager.state());
}

fn publish_label(state: ConnectionState) {
    let all = ConnectionState::ALL.map(|s| s.as_str());
    Metrics::ws_state_set(state.as_str(), &all);
}

fn failure_reason(e: &WsError) -> &'static str {
    match e {
        WsError::ConnectionFailed(_) => "connect_failed",
        WsError::ConnectionClosed { .. } => "closed",
        WsError::SubscriptionError(_) => "subscription_error",
        WsError::ParseError(_) | WsError::Json(_) => "parse_error",
        WsError::Tungstenite(_) => "transport",
        WsError::Shutdown => "shutdown",
    }
}

/// Control handle for a running session.
pub struct SessionHandle {
    id: Uuid,
    token: CancellationToken,
    state: Arc<RwLock<ConnectionState>>,
    events: broadcast::Sender<EngineEvent>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Request a stop. Observed within one receive timeout.
    pub fn stop(&self) {
        info!(id = %self.id, "Session stop requested");
        self.token.cancel();
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Wait for the session task to finish.
    pub async fn join(self) -> AppResult<()> {
        self.task
            .await
            .map_err(|e| AppError::Join(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{engine_state, StaticVolume};
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use veloz_impact::ImpactModelConfig;
    use veloz_ws::SubscriptionTarget;

    fn unreachable_config(reconnect_delay_ms: u64) -> SessionConfig {
        SessionConfig {
            connection: ConnectionConfig {
                url: "ws://127.0.0.1:1".to_string(),
                reconnect_delay_ms,
                recv_timeout_ms: 500,
                subscription: SubscriptionTarget {
                    channel: "books".to_string(),
                    inst_id: "BTC-USDT".to_string(),
                },
            },
            notional: dec!(1000),
            volatility: 0.5,
            report_every: 100,
            event_capacity: 16,
        }
    }

    #[tokio::test]
    async fn test_stop_during_backoff() {
        let state = engine_state(ImpactModelConfig::default(), StaticVolume::ok(1.0));
        let session = Session::new(state, unreachable_config(60_000)).unwrap();
        let mut rx = session.subscribe();
        let handle = session.spawn();

        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Ok(EngineEvent::Connectivity { connected, .. })) => assert!(!connected),
            other => panic!("Expected disconnected event, got {other:?}"),
        }

        handle.stop();
        let state = handle.state.clone();
        tokio::time::timeout(Duration::from_secs(2), handle.join())
            .await
            .expect("stop observed promptly")
            .unwrap();
        assert_eq!(*state.read(), ConnectionState::Stopped);
    }

    #[tokio::test]
    async fn test_zero_report_cadence_rejected() {
        let state = engine_state(ImpactModelConfig::default(), StaticVolume::ok(1.0));
        let mut config = unreachable_config(100);
        config.report_every = 0;
        assert!(Session::new(state, config).is_err());
    }

    #[tokio::test]
    async fn test_handle_ids_unique() {
        let state = engine_state(ImpactModelConfig::default(), StaticVolume::ok(1.0));
        let a = Session::new(state.clone(), unreachable_config(100)).unwrap();
        let b = Session::new(state, unreachable_config(100)).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
