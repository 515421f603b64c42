//! Order-book feed parsing for Veloz.
//!
//! Turns raw channel pushes into validated `OrderBookSnapshot`s, dropping
//! unusable levels and rejecting one-sided books.

pub mod error;
pub mod parser;

pub use error::{FeedError, FeedResult};
pub use parser::{BookParser, RejectionStats};
