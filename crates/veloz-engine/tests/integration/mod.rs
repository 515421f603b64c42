//! Integration tests for veloz-engine.
//!
//! These tests run sessions against a local WebSocket server:
//! - Subscription and book delivery
//! - Rejection of unusable books
//! - Reconnection and shutdown behavior

pub mod common;
