//! Scoring models for Veloz.
//!
//! Models are loaded once at start-up and shared behind the [`Scorer`]
//! trait, so the pipeline never depends on how a score is produced.

pub mod artifact;
pub mod classifier;
pub mod error;
pub mod remote;
pub mod scorer;

pub use artifact::ModelArtifact;
pub use classifier::{Classification, ClassificationService, MakerTakerFeatures};
pub use error::{ModelError, ModelResult};
pub use remote::RemoteScorer;
pub use scorer::{build_scorer, LinearScorer, LogisticScorer, Scorer, ScorerKind, ScorerSource};

/// Feature count of the maker/taker classifier: relative aggressiveness and
/// size/depth ratio.
pub const CLASSIFIER_FEATURES: usize = 2;

/// Feature count of the slippage regressor: relative spread, top-5 depth,
/// 24h volume and order notional.
pub const REGRESSOR_FEATURES: usize = 4;
