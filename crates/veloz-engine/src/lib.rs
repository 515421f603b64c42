//! Veloz transaction-cost engine.
//!
//! Wires the feed, impact solver, classifier and cost aggregator into
//! streaming sessions that publish one cost estimate per accepted book.

pub mod config;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use event::EngineEvent;
pub use pipeline::TickPipeline;
pub use session::{Session, SessionConfig, SessionHandle};
pub use state::EngineState;
