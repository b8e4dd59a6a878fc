//! Sum-of-exponentials kernels and the periodic piecewise-constant baseline.
//!
//! Kernel `(i, j)` is `φ_ij(t) = Σ_u α_iju · β_u · exp(−β_u t)`, so its
//! L1 norm is `Σ_u α_iju`; the branching matrix of a process is the matrix
//! of these norms and its spectral radius governs stationarity.
//!
//! The baseline of node `i` is `μ_ik` on slot `k` of each period, slots
//! being `period_length / n_baselines` long.
use nalgebra::DMatrix;
use ndarray::{Array1, Array3};

use crate::hawkes::errors::{HawkesError, HawkesResult};

/// # Errors
/// [`HawkesError::EmptyDecays`] or [`HawkesError::InvalidDecay`].
pub fn validate_decays(decays: &Array1<f64>) -> HawkesResult<()> {
    if decays.is_empty() {
        return Err(HawkesError::EmptyDecays);
    }
    for (index, &value) in decays.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(HawkesError::InvalidDecay { index, value });
        }
    }
    Ok(())
}

/// Slot layout of a periodic baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBaseline {
    n_baselines: usize,
    period_length: f64,
}

impl PeriodicBaseline {
    /// # Errors
    /// [`HawkesError::InvalidBaselineCount`] or [`HawkesError::InvalidPeriodLength`].
    pub fn new(n_baselines: usize, period_length: f64) -> HawkesResult<Self> {
        if n_baselines == 0 {
            return Err(HawkesError::InvalidBaselineCount { n_baselines });
        }
        if !period_length.is_finite() || period_length <= 0.0 {
            return Err(HawkesError::InvalidPeriodLength { value: period_length });
        }
        Ok(Self { n_baselines, period_length })
    }

    pub fn n_baselines(&self) -> usize {
        self.n_baselines
    }

    pub fn period_length(&self) -> f64 {
        self.period_length
    }

    pub fn slot_length(&self) -> f64 {
        self.period_length / self.n_baselines as f64
    }

    /// Slot active at time `t`, clamped to the last slot against rounding.
    pub fn slot(&self, t: f64) -> usize {
        let k = ((t % self.period_length) / self.slot_length()).floor();
        if k <= 0.0 {
            0
        } else {
            (k as usize).min(self.n_baselines - 1)
        }
    }

    /// Next slot boundary strictly after `t`.
    pub fn next_boundary(&self, t: f64) -> f64 {
        let width = self.slot_length();
        let next = ((t / width).floor() + 1.0) * width;
        if next > t { next } else { next + width }
    }
}

/// Branching matrix `A_ij = Σ_u α_iju` of an `n × n × U` adjacency tensor.
pub fn kernel_norms(adjacency: &Array3<f64>) -> DMatrix<f64> {
    let (n, m, _) = adjacency.dim();
    DMatrix::from_fn(n, m, |i, j| adjacency.slice(ndarray::s![i, j, ..]).sum())
}

/// Largest eigenvalue modulus of the branching matrix.
pub fn spectral_radius(adjacency: &Array3<f64>) -> f64 {
    kernel_norms(adjacency)
        .complex_eigenvalues()
        .iter()
        .map(|z| z.norm())
        .fold(0.0, f64::max)
}
