//! Optimal execution under transient impact.
//!
//! Each pass computes, for every interval `i`, the kernel-weighted history
//! `s_i = sum_{j<=i} v_j^delta * K(i-j)` and the first-order candidate
//! `v_i = (lambda*sigma^2 / (2*delta*s_i))^(1/(2*delta-1))`, rescales the
//! candidate to execute exactly the target, and blends it half-and-half
//! with the previous trajectory. The pass count is fixed; the final
//! trajectory is rescaled once more so it executes exactly the target.
//!
//! The factor `lambda*sigma^2/(2*delta)` is common to every interval and
//! cancels in the rescale, so candidates are formed in log space from
//! `s_i` alone. This keeps the shape finite when the closed form would
//! overflow, and when `sigma` is zero.

use crate::config::ImpactModelConfig;
use crate::error::{ImpactError, ImpactResult};
use crate::kernel::DecayKernel;
use tracing::trace;
use veloz_core::{CostBreakdown, OrderBookSnapshot};

/// Trading rates over `[0, T]`, one per interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionTrajectory {
    pub rates: Vec<f64>,
    pub dt: f64,
}

impl ExecutionTrajectory {
    fn constant(rate: f64, steps: usize, dt: f64) -> Self {
        Self {
            rates: vec![rate; steps],
            dt,
        }
    }

    /// Shares executed: `sum(rate * dt)`.
    pub fn executed(&self) -> f64 {
        self.rates.iter().sum::<f64>() * self.dt
    }
}

/// Outcome of one solve.
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub mid_price: f64,
    pub target_shares: f64,
    pub trajectory: ExecutionTrajectory,
    pub breakdown: CostBreakdown,
    /// Largest rate change in the final pass.
    pub convergence_delta: f64,
}

/// Transient-impact solver. Immutable after construction; every solve
/// starts from the flat rate `target / (T * N)`.
#[derive(Debug, Clone)]
pub struct ImpactSolver {
    config: ImpactModelConfig,
}

impl ImpactSolver {
    pub fn new(config: ImpactModelConfig) -> ImpactResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ImpactModelConfig {
        &self.config
    }

    /// Solve for an order of `notional` currency units against `book`.
    pub fn solve(
        &self,
        book: &OrderBookSnapshot,
        notional: f64,
        volatility: f64,
    ) -> ImpactResult<SolveReport> {
        let mid = book.mid_price();
        if !(mid > 0.0 && mid.is_finite()) {
            return Err(ImpactError::InvalidInput(format!("mid price {mid}")));
        }
        if !(notional >= 0.0 && notional.is_finite()) {
            return Err(ImpactError::InvalidInput(format!("notional {notional}")));
        }
        self.solve_shares(mid, notional / mid, volatility)
    }

    /// Solve for `target` shares at reference price `mid`.
    pub fn solve_shares(&self, mid: f64, target: f64, volatility: f64) -> ImpactResult<SolveReport> {
        let cfg = &self.config;
        if cfg.is_singular() {
            return Err(ImpactError::SingularExponent { delta: cfg.delta });
        }
        if !(volatility >= 0.0 && volatility.is_finite()) {
            return Err(ImpactError::InvalidInput(format!("volatility {volatility}")));
        }
        if !(target >= 0.0 && target.is_finite()) {
            return Err(ImpactError::InvalidInput(format!("target {target}")));
        }

        let n = cfg.steps;
        let dt = cfg.dt();
        let kernel = DecayKernel::new(cfg.gamma, dt, n);

        let initial = target / (cfg.horizon * n as f64);
        let mut trajectory = ExecutionTrajectory::constant(initial, n, dt);
        let mut convergence_delta = 0.0;

        if target > 0.0 {
            let exponent = 1.0 / (2.0 * cfg.delta - 1.0);
            for _ in 0..cfg.iterations {
                let candidate = candidate_rates(&trajectory.rates, &kernel, cfg.delta, exponent);
                let candidate = rescale(candidate, target, dt);

                convergence_delta = 0.0_f64;
                for (old, new) in trajectory.rates.iter_mut().zip(candidate) {
                    let blended = 0.5 * *old + 0.5 * new;
                    convergence_delta = convergence_delta.max((blended - *old).abs());
                    *old = blended;
                }
            }
            // The cold start executes only target / N; close the remaining gap.
            trajectory.rates = rescale(std::mem::take(&mut trajectory.rates), target, dt);
        }

        let breakdown = self.decompose(&trajectory, &kernel, mid, target, volatility);

        trace!(
            mid,
            target,
            executed = trajectory.executed(),
            convergence_delta,
            total = breakdown.total(),
            "Impact solved"
        );

        Ok(SolveReport {
            mid_price: mid,
            target_shares: target,
            trajectory,
            breakdown,
            convergence_delta,
        })
    }

    fn decompose(
        &self,
        trajectory: &ExecutionTrajectory,
        kernel: &DecayKernel,
        mid: f64,
        target: f64,
        volatility: f64,
    ) -> CostBreakdown {
        let cfg = &self.config;
        let dt = trajectory.dt;
        let rates = &trajectory.rates;

        let c_delta = 1.0 / (1.0 + cfg.delta);
        let transient = rates
            .iter()
            .map(|v| v.powf(1.0 + cfg.delta))
            .sum::<f64>()
            * dt.powf(1.0 - cfg.gamma)
            * mid
            * c_delta;

        let history = kernel.convolve(rates);
        let permanent = rates
            .iter()
            .zip(&history)
            .map(|(v, h)| 0.5 * v * h * dt)
            .sum::<f64>()
            * mid
            * cfg.gamma;

        let risk_scale = cfg.lambda * volatility * volatility;
        let mut executed = 0.0;
        let mut risk = 0.0;
        for v in rates {
            let remaining = target - executed;
            risk += risk_scale * remaining * remaining * dt;
            executed += v * dt;
        }
        risk *= mid;

        CostBreakdown {
            transient: transient.max(0.0),
            permanent: permanent.max(0.0),
            risk: risk.max(0.0),
        }
    }
}

/// Unnormalized candidate shape `s_i^(-exponent)`, shifted by its maximum in
/// log space.
fn candidate_rates(rates: &[f64], kernel: &DecayKernel, delta: f64, exponent: f64) -> Vec<f64> {
    let powered: Vec<f64> = rates.iter().map(|v| v.max(0.0).powf(delta)).collect();
    let history = kernel.convolve(&powered);

    let logs: Vec<f64> = history
        .iter()
        .map(|s| {
            if *s > 0.0 {
                -exponent * s.ln()
            } else {
                f64::NEG_INFINITY
            }
        })
        .collect();

    let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![1.0; rates.len()];
    }
    logs.iter().map(|l| (l - max).exp()).collect()
}

/// Scale `shape` so that `sum(rate * dt) == target`.
fn rescale(mut shape: Vec<f64>, target: f64, dt: f64) -> Vec<f64> {
    let total: f64 = shape.iter().sum::<f64>() * dt;
    if !(total > 0.0 && total.is_finite()) {
        let flat = target / (dt * shape.len() as f64);
        shape.iter_mut().for_each(|v| *v = flat);
        return shape;
    }
    let scale = target / total;
    shape.iter_mut().for_each(|v| *v *= scale);
    shape
}
