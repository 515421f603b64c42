//! Impact model parameters.

use crate::error::{ImpactError, ImpactResult};
use serde::Deserialize;

/// Parameters of the transient-impact model.
#[derive(Debug, Clone, Deserialize)]
pub struct ImpactModelConfig {
    /// Impact exponent, in (0, 1).
    #[serde(default = "default_delta")]
    pub delta: f64,
    /// Kernel decay exponent, in (0, 1).
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    /// Risk aversion, > 0.
    #[serde(default = "default_lambda")]
    pub lambda: f64,
    /// Execution horizon T, > 0.
    #[serde(default = "default_horizon")]
    pub horizon: f64,
    /// Number of intervals N, >= 1.
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Fixed-point passes, >= 1.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

fn default_delta() -> f64 {
    0.6
}

fn default_gamma() -> f64 {
    0.45
}

fn default_lambda() -> f64 {
    1e-6
}

fn default_horizon() -> f64 {
    1.0
}

fn default_steps() -> usize {
    100
}

fn default_iterations() -> usize {
    100
}

impl Default for ImpactModelConfig {
    fn default() -> Self {
        Self {
            delta: default_delta(),
            gamma: default_gamma(),
            lambda: default_lambda(),
            horizon: default_horizon(),
            steps: default_steps(),
            iterations: default_iterations(),
        }
    }
}

impl ImpactModelConfig {
    /// Range checks. The singular `2*delta - 1 = 0` case passes here and is
    /// reported by the solver.
    pub fn validate(&self) -> ImpactResult<()> {
        let open_unit = |v: f64| v > 0.0 && v < 1.0;

        if !open_unit(self.delta) {
            return Err(ImpactError::InvalidConfig(format!(
                "delta must be in (0, 1), got {}",
                self.delta
            )));
        }
        if !open_unit(self.gamma) {
            return Err(ImpactError::InvalidConfig(format!(
                "gamma must be in (0, 1), got {}",
                self.gamma
            )));
        }
        if !(self.lambda > 0.0 && self.lambda.is_finite()) {
            return Err(ImpactError::InvalidConfig(format!(
                "lambda must be > 0, got {}",
                self.lambda
            )));
        }
        if !(self.horizon > 0.0 && self.horizon.is_finite()) {
            return Err(ImpactError::InvalidConfig(format!(
                "horizon must be > 0, got {}",
                self.horizon
            )));
        }
        if self.steps < 1 {
            return Err(ImpactError::InvalidConfig("steps must be >= 1".to_string()));
        }
        if self.iterations < 1 {
            return Err(ImpactError::InvalidConfig(
                "iterations must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn dt(&self) -> f64 {
        self.horizon / self.steps as f64
    }

    /// True when the closed-form rate exponent `1/(2*delta - 1)` is undefined.
    pub fn is_singular(&self) -> bool {
        (2.0 * self.delta - 1.0).abs() < f64::EPSILON
    }
}
