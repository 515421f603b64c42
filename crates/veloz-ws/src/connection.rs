//! WebSocket connection manager.
//!
//! Handles the connection lifecycle for one book subscription: connect,
//! subscribe, bounded receive, and fixed-delay backoff between attempts.
//! Retries are unbounded; only a shutdown request ends the cycle.

use crate::error::{WsError, WsResult};
use crate::message::{PushMessage, WsMessage, WsRequest};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Subscription target: one channel for one instrument.
#[derive(Debug, Clone)]
pub struct SubscriptionTarget {
    /// Channel name (e.g., "books", "books5").
    pub channel: String,
    /// Instrument identifier (e.g., "BTC-USDT").
    pub inst_id: String,
}

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL.
    pub url: String,
    /// Fixed delay between reconnection attempts.
    pub reconnect_delay_ms: u64,
    /// Upper bound on a single receive (and on the connect handshake).
    pub recv_timeout_ms: u64,
    /// Book channel to subscribe to.
    pub subscription: SubscriptionTarget,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "wss://ws.okx.com:8443/ws/v5/public".to_string(),
            reconnect_delay_ms: 2000,
            recv_timeout_ms: 5000,
            subscription: SubscriptionTarget {
                channel: "books".to_string(),
                inst_id: "BTC-USDT".to_string(),
            },
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Subscribed,
    Streaming,
    Backoff,
    /// Terminal: entered on shutdown from any state.
    Stopped,
}

impl ConnectionState {
    /// Stable label for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Streaming => "streaming",
            Self::Backoff => "backoff",
            Self::Stopped => "stopped",
        }
    }

    pub const ALL: [ConnectionState; 6] = [
        Self::Disconnected,
        Self::Connecting,
        Self::Subscribed,
        Self::Streaming,
        Self::Backoff,
        Self::Stopped,
    ];
}

/// Outcome of one bounded receive.
#[derive(Debug)]
pub enum Received {
    /// A data push, with the time spent waiting for it.
    Push {
        message: PushMessage,
        waited: Duration,
    },
    /// Nothing arrived within the receive timeout.
    Idle,
    /// Shutdown was requested while waiting.
    Shutdown,
}

/// WebSocket connection manager.
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: Arc<RwLock<ConnectionState>>,
    /// Consecutive failed attempts since the last successful subscribe.
    reconnect_count: AtomicU32,
    /// Cancellation token for graceful shutdown.
    shutdown_token: CancellationToken,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new(config: ConnectionConfig, shutdown_token: CancellationToken) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            reconnect_count: AtomicU32::new(0),
            shutdown_token,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Shared handle on the state, for observers outside the session task.
    pub fn state_handle(&self) -> Arc<RwLock<ConnectionState>> {
        self.state.clone()
    }

    pub fn reconnect_count(&self) -> u32 {
        self.reconnect_count.load(Ordering::Relaxed)
    }

    /// Check if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Enter the terminal state.
    pub fn mark_stopped(&self) {
        *self.state.write() = ConnectionState::Stopped;
    }

    /// Connect and send the subscribe request. The state moves to
    /// `Subscribed` when the venue acknowledges it.
    ///
    /// The handshake is bounded by the receive timeout and abandoned on
    /// shutdown.
    pub async fn open(&self) -> WsResult<FeedStream> {
        if self.is_shutdown() {
            return Err(WsError::Shutdown);
        }

        *self.state.write() = ConnectionState::Connecting;
        info!(url = %self.config.url, "Connecting to WebSocket");

        let timeout = Duration::from_millis(self.config.recv_timeout_ms);
        let connect = connect_async_tls_with_config(&self.config.url, None, true, None);

        let ws_stream = tokio::select! {
            () = self.shutdown_token.cancelled() => return Err(WsError::Shutdown),
            result = tokio::time::timeout(timeout, connect) => match result {
                Ok(connected) => connected?.0,
                Err(_) => {
                    return Err(WsError::ConnectionFailed(format!(
                        "handshake exceeded {}ms",
                        self.config.recv_timeout_ms
                    )))
                }
            },
        };

        let (mut write, read) = ws_stream.split();

        let target = &self.config.subscription;
        let request = WsRequest::subscribe(&target.channel, &target.inst_id);
        write.send(Message::Text(serde_json::to_string(&request)?)).await?;

        self.reconnect_count.store(0, Ordering::Relaxed);
        info!(
            channel = %target.channel,
            inst_id = %target.inst_id,
            "Subscription sent"
        );

        Ok(FeedStream {
            write,
            read,
            state: self.state.clone(),
            recv_timeout: timeout,
            shutdown_token: self.shutdown_token.clone(),
        })
    }

    /// Wait out the fixed reconnect delay.
    ///
    /// Returns `false` if shutdown was requested during the wait.
    pub async fn backoff(&self) -> bool {
        *self.state.write() = ConnectionState::Backoff;
        let attempt = self.reconnect_count.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = Duration::from_millis(self.config.reconnect_delay_ms);
        warn!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");

        tokio::select! {
            () = tokio::time::sleep(delay) => true,
            () = self.shutdown_token.cancelled() => {
                info!("Shutdown requested during backoff");
                false
            }
        }
    }
}

/// An open, subscribed connection.
pub struct FeedStream {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    state: Arc<RwLock<ConnectionState>>,
    recv_timeout: Duration,
    shutdown_token: CancellationToken,
}

impl FeedStream {
    /// Receive the next data push.
    ///
    /// Control traffic (acks, pongs, pings) is handled here and never
    /// returned. A subscription error event or a closed stream is an error;
    /// the caller reconnects.
    pub async fn recv(&mut self) -> WsResult<Received> {
        let started = Instant::now();

        loop {
            let remaining = self.recv_timeout.saturating_sub(started.elapsed());

            let msg = tokio::select! {
                biased;

                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received in message loop");
                    if let Err(e) = self.write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during shutdown");
                    }
                    return Ok(Received::Shutdown);
                }

                result = tokio::time::timeout(remaining, self.read.next()) => match result {
                    Ok(msg) => msg,
                    Err(_) => {
                        debug!("Receive timed out, sending keep-alive");
                        self.write.send(Message::Text("ping".to_string())).await?;
                        return Ok(Received::Idle);
                    }
                },
            };

            match msg {
                Some(Ok(Message::Text(text))) => match WsMessage::parse(&text)? {
                    WsMessage::Push(message) => {
                        if *self.state.read() != ConnectionState::Streaming {
                            *self.state.write() = ConnectionState::Streaming;
                            info!(channel = %message.arg.channel, "Streaming");
                        }
                        return Ok(Received::Push {
                            message,
                            waited: started.elapsed(),
                        });
                    }
                    WsMessage::Event(ev) if ev.is_error() => {
                        let detail = format!(
                            "code={} msg={}",
                            ev.code.unwrap_or_default(),
                            ev.msg.unwrap_or_default()
                        );
                        error!(%detail, "Subscription rejected");
                        return Err(WsError::SubscriptionError(detail));
                    }
                    WsMessage::Event(ev) if ev.is_subscribe_ack() => {
                        *self.state.write() = ConnectionState::Subscribed;
                        info!(arg = ?ev.arg, conn_id = ?ev.conn_id, "Subscribed");
                    }
                    WsMessage::Event(ev) => {
                        debug!(event = %ev.event, arg = ?ev.arg, "Control event");
                    }
                    WsMessage::Pong => {
                        debug!("Received keep-alive pong");
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    debug!("Received ping, sending pong");
                    self.write.send(Message::Pong(data)).await?;
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (f.code.into(), f.reason.to_string()))
                        .unwrap_or((1000, "Normal close".to_string()));
                    warn!(code, %reason, "WebSocket closed by server");
                    return Err(WsError::ConnectionClosed { code, reason });
                }
                Some(Err(e)) => {
                    error!(?e, "WebSocket read error");
                    return Err(e.into());
                }
                None => {
                    warn!("WebSocket stream ended");
                    return Err(WsError::ConnectionClosed {
                        code: 1006,
                        reason: "Stream ended".to_string(),
                    });
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConnectionConfig::default();
        assert_eq!(config.reconnect_delay_ms, 2000);
        assert_eq!(config.recv_timeout_ms, 5000);
        assert_eq!(config.subscription.channel, "books");
    }

    #[test]
    fn test_state_labels_unique() {
        let labels: std::collections::HashSet<_> =
            ConnectionState::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(labels.len(), ConnectionState::ALL.len());
    }

    #[tokio::test]
    async fn test_open_after_shutdown_refused() {
        let token = CancellationToken::new();
        let manager = ConnectionManager::new(ConnectionConfig::default(), token.clone());
        token.cancel();

        assert!(matches!(manager.open().await, Err(WsError::Shutdown)));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_backoff_interrupted_by_shutdown() {
        let token = CancellationToken::new();
        let config = ConnectionConfig {
            reconnect_delay_ms: 60_000,
            ..Default::default()
        };
        let manager = ConnectionManager::new(config, token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let started = Instant::now();
        assert!(!manager.backoff().await);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(manager.state(), ConnectionState::Backoff);
        assert_eq!(manager.reconnect_count(), 1);
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_backoff_waits_fixed_delay() {
        let manager = ConnectionManager::new(
            ConnectionConfig {
                reconnect_delay_ms: 50,
                ..Default::default()
            },
            CancellationToken::new(),
        );

        let started = Instant::now();
        assert!(manager.backoff().await);
        assert!(manager.backoff().await);
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(manager.reconnect_count(), 2);
    }
}
