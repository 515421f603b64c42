//! Session lifecycle integration tests.
//!
//! Tests a full session against a local server:
//! - Subscription and tick emission
//! - Skipping unusable books
//! - Keep-alive, reconnection and shutdown

mod integration;
use integration::common::fixtures::{
    empty_asks_push, engine_state, sample_book_push, session_config,
};
use integration::common::mock_ws::{MockBehavior, MockWsServer};

use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::timeout;
use veloz_core::{TickResult, VolumeProvenance};
use veloz_engine::{EngineEvent, Session};
use veloz_telemetry::LatencyReport;
use veloz_ws::ConnectionState;

async fn next_tick(rx: &mut broadcast::Receiver<EngineEvent>) -> TickResult {
    timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(EngineEvent::Tick(tick)) = rx.recv().await {
                return tick;
            }
        }
    })
    .await
    .expect("tick within timeout")
}

async fn next_report(rx: &mut broadcast::Receiver<EngineEvent>) -> LatencyReport {
    timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(EngineEvent::Latency(report)) = rx.recv().await {
                return report;
            }
        }
    })
    .await
    .expect("latency report within timeout")
}

async fn next_connectivity(rx: &mut broadcast::Receiver<EngineEvent>) -> (bool, Instant) {
    timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(EngineEvent::Connectivity { connected, at }) = rx.recv().await {
                return (connected, at);
            }
        }
    })
    .await
    .expect("connectivity event within timeout")
}

/// A valid book produces one cost estimate.
#[tokio::test]
async fn test_session_emits_tick_for_book() {
    let server = MockWsServer::start(MockBehavior {
        pushes: vec![sample_book_push()],
        ..Default::default()
    })
    .await;

    let session = Session::new(engine_state(), session_config(server.url(), 100, 1000)).unwrap();
    let mut rx = session.subscribe();
    let handle = session.spawn();

    let tick = next_tick(&mut rx).await;
    assert_eq!(tick.inst_id, "BTC-USDT");
    assert_eq!(tick.ts_ms, 1_700_000_000_000);
    assert_eq!(tick.fee, 1.0);
    assert_eq!(tick.volume, VolumeProvenance::Fresh);
    assert!(!tick.impact_fallback);
    assert!((tick.net_cost - (tick.slippage + tick.impact.total() + tick.fee)).abs() < 1e-9);
    assert_eq!(handle.state(), ConnectionState::Streaming);

    handle.stop();
    timeout(Duration::from_secs(2), handle.join())
        .await
        .expect("join within timeout")
        .unwrap();
    server.shutdown().await;
}

/// A book with an empty side is skipped and never reaches the latency window.
#[tokio::test]
async fn test_empty_side_skipped() {
    let server = MockWsServer::start(MockBehavior {
        pushes: vec![empty_asks_push(), sample_book_push()],
        ..Default::default()
    })
    .await;

    let session = Session::new(engine_state(), session_config(server.url(), 100, 1000)).unwrap();
    let mut rx = session.subscribe();
    let handle = session.spawn();

    let tick = next_tick(&mut rx).await;
    assert_eq!(tick.ts_ms, 1_700_000_000_000);

    let report = next_report(&mut rx).await;
    assert_eq!(report.total_ticks, 1);
    assert_eq!(report.samples, 1);

    handle.stop();
    let _ = timeout(Duration::from_secs(2), handle.join()).await;
    server.shutdown().await;
}

/// The subscribe request names the configured channel and instrument.
#[tokio::test]
async fn test_session_sends_subscription() {
    let server = MockWsServer::start(MockBehavior::default()).await;

    let session = Session::new(engine_state(), session_config(server.url(), 100, 1000)).unwrap();
    let mut rx = session.subscribe();
    let handle = session.spawn();

    let (connected, _) = next_connectivity(&mut rx).await;
    assert!(connected);

    let subscribed = timeout(Duration::from_secs(2), async {
        loop {
            let messages = server.received_messages().await;
            if let Some(m) = messages.iter().find(|m| m.contains("subscribe")) {
                return m.clone();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("subscribe within timeout");

    let parsed: serde_json::Value = serde_json::from_str(&subscribed).unwrap();
    assert_eq!(parsed["op"], "subscribe");
    assert_eq!(parsed["args"][0]["channel"], "books");
    assert_eq!(parsed["args"][0]["instId"], "BTC-USDT");

    handle.stop();
    let _ = timeout(Duration::from_secs(2), handle.join()).await;
    server.shutdown().await;
}

/// An idle feed gets a keep-alive instead of a reconnect.
#[tokio::test]
async fn test_idle_feed_sends_keepalive() {
    let server = MockWsServer::start(MockBehavior::default()).await;

    let session = Session::new(engine_state(), session_config(server.url(), 100, 200)).unwrap();
    let handle = session.spawn();

    let pinged = timeout(Duration::from_secs(3), async {
        loop {
            if server.received_messages().await.iter().any(|m| m == "ping") {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    assert!(pinged.is_ok(), "Should send keep-alive after receive timeout");
    assert_eq!(server.connection_count().await, 1);

    handle.stop();
    let _ = timeout(Duration::from_secs(2), handle.join()).await;
    server.shutdown().await;
}

/// A dropped connection is retried after the fixed delay.
#[tokio::test]
async fn test_reconnects_after_drop() {
    let server = MockWsServer::start(MockBehavior {
        drop_first: true,
        ..Default::default()
    })
    .await;

    let delay_ms = 300;
    let session =
        Session::new(engine_state(), session_config(server.url(), delay_ms, 1000)).unwrap();
    let mut rx = session.subscribe();
    let handle = session.spawn();

    // The first open may or may not complete before the close is seen.
    let lost_at = loop {
        let (connected, at) = next_connectivity(&mut rx).await;
        if !connected {
            break at;
        }
    };
    let (connected, restored_at) = next_connectivity(&mut rx).await;
    assert!(connected);
    assert!(restored_at.duration_since(lost_at) >= Duration::from_millis(delay_ms));
    assert!(server.connection_count().await >= 2);

    handle.stop();
    let _ = timeout(Duration::from_secs(2), handle.join()).await;
    server.shutdown().await;
}

/// Stop ends the session and leaves it in the stopped state.
#[tokio::test]
async fn test_stop_reaches_stopped_state() {
    let server = MockWsServer::start(MockBehavior::default()).await;

    let session = Session::new(engine_state(), session_config(server.url(), 100, 200)).unwrap();
    let mut rx = session.subscribe();
    let handle = session.spawn();

    let (connected, _) = next_connectivity(&mut rx).await;
    assert!(connected);

    handle.stop();
    let (connected, _) = next_connectivity(&mut rx).await;
    assert!(!connected);

    let state = timeout(Duration::from_secs(2), async {
        loop {
            let state = handle.state();
            if state == ConnectionState::Stopped {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("stopped within timeout");
    assert_eq!(state, ConnectionState::Stopped);

    timeout(Duration::from_secs(2), handle.join())
        .await
        .expect("join within timeout")
        .unwrap();
    server.shutdown().await;
}

/// Events emitted while stopping stay readable after join, then the channel closes.
#[tokio::test]
async fn test_events_drain_after_join() {
    let server = MockWsServer::start(MockBehavior::default()).await;

    let session = Session::new(engine_state(), session_config(server.url(), 100, 200)).unwrap();
    let mut rx = session.subscribe();
    let handle = session.spawn();

    let (connected, _) = next_connectivity(&mut rx).await;
    assert!(connected);

    handle.stop();
    timeout(Duration::from_secs(2), handle.join())
        .await
        .expect("join within timeout")
        .unwrap();

    let mut saw_disconnect = false;
    loop {
        match rx.recv().await {
            Ok(EngineEvent::Connectivity { connected, .. }) => saw_disconnect |= !connected,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    assert!(saw_disconnect, "Disconnect must be delivered before the channel closes");

    server.shutdown().await;
}
