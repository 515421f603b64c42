//! Power-law decay kernel.
//!
//! The point kernel `(t_i - t_j)^(-gamma)` is infinite on the diagonal, so
//! each lag is weighted by the kernel's average over its interval.

/// Cell-averaged kernel weights, indexed by lag `i - j`.
#[derive(Debug, Clone)]
pub struct DecayKernel {
    weights: Vec<f64>,
}

impl DecayKernel {
    /// `w_k = ((k+1)^(1-gamma) - k^(1-gamma)) * dt^(-gamma) / (1-gamma)`
    pub fn new(gamma: f64, dt: f64, steps: usize) -> Self {
        let a = 1.0 - gamma;
        let scale = dt.powf(-gamma) / a;
        let weights = (0..steps)
            .map(|k| {
                let k = k as f64;
                ((k + 1.0).powf(a) - k.powf(a)) * scale
            })
            .collect();
        Self { weights }
    }

    #[inline]
    pub fn weight(&self, lag: usize) -> f64 {
        self.weights[lag]
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// `sum_{j<=i} f(j) * w_{i-j}` for every `i`.
    pub fn convolve(&self, values: &[f64]) -> Vec<f64> {
        (0..values.len())
            .map(|i| {
                values[..=i]
                    .iter()
                    .enumerate()
                    .map(|(j, v)| v * self.weights[i - j])
                    .sum()
            })
            .collect()
    }
}
