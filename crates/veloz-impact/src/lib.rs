//! Market-impact estimation for Veloz.
//!
//! Solves for an execution trajectory under a power-law transient-impact
//! model and decomposes its cost into transient, permanent and risk terms.

pub mod config;
pub mod error;
pub mod kernel;
pub mod solver;

pub use config::ImpactModelConfig;
pub use error::{ImpactError, ImpactResult};
pub use solver::{ExecutionTrajectory, ImpactSolver, SolveReport};
