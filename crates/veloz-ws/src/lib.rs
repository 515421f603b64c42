//! Streaming order-book WebSocket client for Veloz.
//!
//! Provides the connection half of order-book ingestion:
//! - Fixed-delay reconnection with unbounded retries
//! - Book-channel subscription for one instrument
//! - Bounded receive (a timeout means "no new data", not a failure)
//! - Text keep-alive on idle connections
//! - Cooperative shutdown through a cancellation token

pub mod connection;
pub mod error;
pub mod message;

pub use connection::{
    ConnectionConfig, ConnectionManager, ConnectionState, FeedStream, Received, SubscriptionTarget,
};
pub use error::{WsError, WsResult};
pub use message::{EventMessage, PushMessage, SubscriptionArg, WsMessage, WsRequest};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket or HTTPS connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
