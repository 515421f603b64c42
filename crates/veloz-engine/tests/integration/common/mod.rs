//! Shared integration-test helpers.

pub mod fixtures;
pub mod mock_ws;
