//! Least-squares contrast for Hawkes processes with sum-of-exponentials
//! kernels and a periodic piecewise-constant baseline.
//!
//! Purpose
//! -------
//! Turn a set of realizations into the sufficient statistics ("weights") of
//! the least-squares contrast, so that `loss` and `grad` at any coefficient
//! vector cost `O(D · F²)` regardless of the number of jumps.
//!
//! Key behaviors
//! -------------
//! - Node `i`'s intensity is linear in its coefficients:
//!   `λ_i(t) = θ_i · f(t)`, where the feature vector
//!   `f(t) = (1{slot(t) = k})_k ⊕ (G_ju(t))_{j,u}` and
//!   `G_ju(t) = Σ_{t_jk < t} β_u exp(−β_u (t − t_jk))`. Features are shared by
//!   every node, so a single Gram matrix `H = ∫ f fᵀ dt` serves all of them.
//! - The contrast is `(1/N) Σ_i (θ_iᵀ H θ_i − 2 θ_i · b_i)` with
//!   `b_i = Σ_k f(t_ik⁻)` and `N` the total number of jumps.
//! - `H` and `b` are computed exactly by sweeping events and slot
//!   boundaries, in a dedicated rayon pool of `n_threads` workers (one task
//!   per realization). Per-realization results are summed in realization
//!   order, so the weights do not depend on the thread count.
//!
//! Conventions
//! -----------
//! - Coefficients: `D·K` baselines first (`μ_ik` at `i·K + k`), then the
//!   `D·D·U` adjacency (`α_iju` at `D·K + i·D·U + j·U + u`).
//! - Feature index: `k` for baseline slot `k`, `K + j·U + u` for `G_ju`.
use std::time::Instant;

use ndarray::{s, Array1, Array2, Array3, ArrayView1};
use rayon::prelude::*;
use tracing::debug;

use crate::{
    hawkes::{
        data::{common_node_count, HawkesRealization},
        errors::{HawkesError, HawkesResult},
        kernels::{validate_decays, PeriodicBaseline},
    },
    optimization::{
        errors::OptResult,
        solver::{
            traits::Model,
            types::{Coeffs, Cost, Grad},
        },
    },
};

/// Sufficient statistics of the least-squares contrast.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSqWeights {
    gram: Array2<f64>,
    b: Array2<f64>,
    n_jumps: usize,
}

impl LeastSqWeights {
    fn zeros(n_nodes: usize, n_features: usize) -> Self {
        Self {
            gram: Array2::zeros((n_features, n_features)),
            b: Array2::zeros((n_nodes, n_features)),
            n_jumps: 0,
        }
    }

    fn accumulate(&mut self, other: &LeastSqWeights) {
        self.gram += &other.gram;
        self.b += &other.b;
        self.n_jumps += other.n_jumps;
    }

    /// `∫ f fᵀ dt`, summed over realizations.
    pub fn gram(&self) -> &Array2<f64> {
        &self.gram
    }

    /// Row `i` holds `Σ_k f(t_ik⁻)` for node `i`.
    pub fn b(&self) -> &Array2<f64> {
        &self.b
    }

    pub fn n_jumps(&self) -> usize {
        self.n_jumps
    }
}

#[derive(Debug, Clone)]
pub struct ModelHawkesSumExpKernLeastSq {
    decays: Array1<f64>,
    baseline: PeriodicBaseline,
    n_threads: usize,
    n_nodes: usize,
    realizations: Vec<HawkesRealization>,
    weights: Option<LeastSqWeights>,
}

impl ModelHawkesSumExpKernLeastSq {
    /// # Errors
    /// Invalid decays, baseline layout, or `n_threads == 0`.
    pub fn new(
        decays: Array1<f64>, n_baselines: usize, period_length: f64, n_threads: usize,
    ) -> HawkesResult<Self> {
        validate_decays(&decays)?;
        let baseline = PeriodicBaseline::new(n_baselines, period_length)?;
        if n_threads == 0 {
            return Err(HawkesError::InvalidThreadCount { n_threads });
        }
        Ok(Self {
            decays,
            baseline,
            n_threads,
            n_nodes: 0,
            realizations: Vec::new(),
            weights: None,
        })
    }

    /// Store the realizations and compute the weights.
    ///
    /// # Errors
    /// - [`HawkesError::NoRealizations`] / [`HawkesError::NodeCountMismatch`].
    /// - [`HawkesError::NoEvents`] when no realization has a jump.
    /// - [`HawkesError::ThreadPool`] if the worker pool cannot be built.
    pub fn fit(&mut self, realizations: Vec<HawkesRealization>) -> HawkesResult<&mut Self> {
        let n_nodes = common_node_count(&realizations)?;
        if realizations.iter().all(|r| r.n_jumps() == 0) {
            return Err(HawkesError::NoEvents);
        }
        self.n_nodes = n_nodes;
        self.realizations = realizations;
        self.weights = None;
        self.compute_weights()?;
        Ok(self)
    }

    /// (Re)compute `H` and `b` from the stored realizations.
    ///
    /// # Errors
    /// [`HawkesError::ModelNotFitted`] without realizations;
    /// [`HawkesError::ThreadPool`] if the worker pool cannot be built.
    pub fn compute_weights(&mut self) -> HawkesResult<()> {
        if self.realizations.is_empty() {
            return Err(HawkesError::ModelNotFitted);
        }
        let clock = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.n_threads).build()?;
        let partial: Vec<LeastSqWeights> = pool.install(|| {
            self.realizations.par_iter().map(|r| self.realization_weights(r)).collect()
        });
        let mut weights = LeastSqWeights::zeros(self.n_nodes, self.n_features());
        for w in &partial {
            weights.accumulate(w);
        }
        debug!(
            n_realizations = self.realizations.len(),
            n_jumps = weights.n_jumps,
            n_threads = self.n_threads,
            elapsed_s = clock.elapsed().as_secs_f64(),
            "Hawkes least-squares weights computed"
        );
        self.weights = Some(weights);
        Ok(())
    }

    /// Exact `H` and `b` contributions of one realization.
    fn realization_weights(&self, realization: &HawkesRealization) -> LeastSqWeights {
        let n_decays = self.decays.len();
        let n_baselines = self.baseline.n_baselines();
        let mut weights = LeastSqWeights::zeros(self.n_nodes, self.n_features());
        weights.n_jumps = realization.n_jumps();
        let mut g = Array1::<f64>::zeros(self.n_nodes * n_decays);
        let mut t = 0.0;

        for (t_event, node) in realization.merged_events() {
            self.integrate(&mut weights.gram, &mut g, t, t_event);
            t = t_event;
            let mut row = weights.b.row_mut(node);
            row[self.baseline.slot(t)] += 1.0;
            row.slice_mut(s![n_baselines..]).scaled_add(1.0, &g);
            let mut g_node = g.slice_mut(s![node * n_decays..(node + 1) * n_decays]);
            g_node += &self.decays;
        }
        self.integrate(&mut weights.gram, &mut g, t, realization.end_time());
        weights
    }

    /// Add `∫_{from}^{to} f fᵀ` to `gram` and decay `g` to `to`.
    ///
    /// The interval is cut at slot boundaries; on each piece the baseline
    /// feature is constant and every `G` decays exponentially from its
    /// value at the piece start, which gives closed-form integrals.
    fn integrate(&self, gram: &mut Array2<f64>, g: &mut Array1<f64>, from: f64, to: f64) {
        let n_baselines = self.baseline.n_baselines();
        let n_decays = self.decays.len();
        let rates: Vec<f64> = (0..g.len()).map(|a| self.decays[a % n_decays]).collect();
        let mut t = from;
        while t < to {
            let next = self.baseline.next_boundary(t).min(to);
            let delta = next - t;
            let k = self.baseline.slot(t + 0.5 * delta);
            gram[[k, k]] += delta;
            for a in 0..g.len() {
                let g_a = g[a];
                if g_a == 0.0 {
                    continue;
                }
                let beta_a = rates[a];
                let cross = g_a * (1.0 - (-beta_a * delta).exp()) / beta_a;
                gram[[k, n_baselines + a]] += cross;
                gram[[n_baselines + a, k]] += cross;
                for b in 0..g.len() {
                    let beta_ab = beta_a + rates[b];
                    gram[[n_baselines + a, n_baselines + b]] +=
                        g_a * g[b] * (1.0 - (-beta_ab * delta).exp()) / beta_ab;
                }
            }
            for (g_a, beta_a) in g.iter_mut().zip(&rates) {
                *g_a *= (-beta_a * delta).exp();
            }
            t = next;
        }
    }

    fn fitted_weights(&self) -> HawkesResult<&LeastSqWeights> {
        self.weights.as_ref().ok_or(HawkesError::ModelNotFitted)
    }

    fn check_coeffs(&self, coeffs: &Coeffs) -> HawkesResult<()> {
        if coeffs.len() != self.n_coeffs() {
            return Err(HawkesError::CoeffsDimMismatch {
                expected: self.n_coeffs(),
                found: coeffs.len(),
            });
        }
        Ok(())
    }

    /// `θ_i = (μ_i, α_i)` gathered from the flat coefficient layout.
    fn node_coeffs(&self, coeffs: &Coeffs, node: usize) -> Array1<f64> {
        let n_baselines = self.baseline.n_baselines();
        let n_adj = self.n_nodes * self.decays.len();
        let adj_start = self.n_nodes * n_baselines + node * n_adj;
        let mut theta = Array1::zeros(self.n_features());
        theta
            .slice_mut(s![..n_baselines])
            .assign(&coeffs.slice(s![node * n_baselines..(node + 1) * n_baselines]));
        theta.slice_mut(s![n_baselines..]).assign(&coeffs.slice(s![adj_start..adj_start + n_adj]));
        theta
    }

    /// Least-squares contrast at `coeffs`.
    ///
    /// # Errors
    /// [`HawkesError::ModelNotFitted`] or [`HawkesError::CoeffsDimMismatch`].
    pub fn loss_value(&self, coeffs: &Coeffs) -> HawkesResult<f64> {
        let weights = self.fitted_weights()?;
        self.check_coeffs(coeffs)?;
        let total: f64 = (0..self.n_nodes)
            .map(|i| {
                let theta = self.node_coeffs(coeffs, i);
                theta.dot(&weights.gram.dot(&theta)) - 2.0 * theta.dot(&weights.b.row(i))
            })
            .sum();
        Ok(total / weights.n_jumps as f64)
    }

    /// Gradient of [`Self::loss_value`].
    ///
    /// # Errors
    /// [`HawkesError::ModelNotFitted`] or [`HawkesError::CoeffsDimMismatch`].
    pub fn grad_value(&self, coeffs: &Coeffs) -> HawkesResult<Grad> {
        let weights = self.fitted_weights()?;
        self.check_coeffs(coeffs)?;
        let n_baselines = self.baseline.n_baselines();
        let n_adj = self.n_nodes * self.decays.len();
        let scale = 2.0 / weights.n_jumps as f64;
        let mut grad = Grad::zeros(self.n_coeffs());
        for i in 0..self.n_nodes {
            let theta = self.node_coeffs(coeffs, i);
            let block = (weights.gram.dot(&theta) - &weights.b.row(i)) * scale;
            let adj_start = self.n_nodes * n_baselines + i * n_adj;
            grad.slice_mut(s![i * n_baselines..(i + 1) * n_baselines])
                .assign(&block.slice(s![..n_baselines]));
            grad.slice_mut(s![adj_start..adj_start + n_adj]).assign(&block.slice(s![n_baselines..]));
        }
        Ok(grad)
    }

    /// Pack a `D × K` baseline and a `D × D × U` adjacency into the flat
    /// coefficient layout.
    ///
    /// # Errors
    /// [`HawkesError::BaselineShape`] / [`HawkesError::AdjacencyShape`].
    pub fn coeffs_from_parts(
        &self, baseline: &Array2<f64>, adjacency: &Array3<f64>,
    ) -> HawkesResult<Coeffs> {
        let (d, k, u) = (self.n_nodes, self.baseline.n_baselines(), self.decays.len());
        if baseline.dim() != (d, k) {
            return Err(HawkesError::BaselineShape { expected: (d, k), found: baseline.dim() });
        }
        if adjacency.dim() != (d, d, u) {
            return Err(HawkesError::AdjacencyShape {
                expected: (d, d, u),
                found: adjacency.dim(),
            });
        }
        Ok(baseline.iter().chain(adjacency.iter()).copied().collect())
    }

    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn n_baselines(&self) -> usize {
        self.baseline.n_baselines()
    }

    pub fn period_length(&self) -> f64 {
        self.baseline.period_length()
    }

    pub fn decays(&self) -> ArrayView1<'_, f64> {
        self.decays.view()
    }

    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    /// Length of a node's feature vector, `K + D·U`.
    pub fn n_features(&self) -> usize {
        self.baseline.n_baselines() + self.n_nodes * self.decays.len()
    }

    pub fn weights(&self) -> Option<&LeastSqWeights> {
        self.weights.as_ref()
    }

    pub fn realizations(&self) -> &[HawkesRealization] {
        &self.realizations
    }
}

impl Model for ModelHawkesSumExpKernLeastSq {
    /// `D·K + D·D·U`; zero before `fit`.
    fn n_coeffs(&self) -> usize {
        self.n_nodes * self.baseline.n_baselines() + self.n_nodes * self.n_nodes * self.decays.len()
    }

    fn loss(&self, coeffs: &Coeffs) -> OptResult<Cost> {
        Ok(self.loss_value(coeffs)?)
    }

    fn grad(&self, coeffs: &Coeffs) -> OptResult<Grad> {
        Ok(self.grad_value(coeffs)?)
    }
}
