//! Ogata-thinning simulation of Hawkes processes with sum-of-exponentials
//! kernels and a periodic piecewise-constant baseline.
//!
//! Purpose
//! -------
//! Produce realizations for benchmarking and testing the estimators. This is
//! the minimal thinning loop needed for that: no intensity tracking, no
//! threshold on the number of jumps, no kernel families beyond exponentials.
//!
//! Key behaviors
//! -------------
//! - Between events, the excitation state `g_ju` only decays, so the total
//!   intensity is bounded by `Σ_i (max_k μ_ik + Σ_{j,u} α_iju g_ju)` evaluated
//!   at the last accepted or rejected candidate.
//! - Candidates are drawn from an exponential waiting time with that bound
//!   (`statrs::Exp`) and accepted with probability `λ(t) / bound`.
//! - A given seed always yields the same realization; [`SimuHawkesMulti`]
//!   uses `seed + k` for run `k`, so its output does not depend on how rayon
//!   schedules the runs.
use ndarray::{Array1, Array2, Array3, Axis, Zip};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use statrs::distribution::Exp;
use tracing::debug;

use crate::hawkes::{
    data::HawkesRealization,
    errors::{HawkesError, HawkesResult},
    kernels::{spectral_radius, validate_decays, PeriodicBaseline},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SimuHawkesSumExpKernels {
    baseline: Array2<f64>,
    layout: PeriodicBaseline,
    decays: Array1<f64>,
    adjacency: Array3<f64>,
    end_time: f64,
    seed: u64,
}

impl SimuHawkesSumExpKernels {
    /// `baseline` is `D × K` (one value per node and period slot) and
    /// `adjacency` is `D × D × U` (`α_iju`, influence of node `j` on `i`
    /// through decay `u`).
    ///
    /// # Errors
    /// Shape mismatches, negative or non-finite entries, invalid decays,
    /// period length or end time.
    pub fn new(
        baseline: Array2<f64>, period_length: f64, decays: Array1<f64>, adjacency: Array3<f64>,
        end_time: f64, seed: u64,
    ) -> HawkesResult<Self> {
        validate_decays(&decays)?;
        let (n_nodes, n_baselines) = baseline.dim();
        if n_nodes == 0 {
            return Err(HawkesError::NoNodes);
        }
        let layout = PeriodicBaseline::new(n_baselines, period_length)?;
        for ((node, slot), &value) in baseline.indexed_iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(HawkesError::InvalidBaseline { node, slot, value });
            }
        }
        let expected = (n_nodes, n_nodes, decays.len());
        if adjacency.dim() != expected {
            return Err(HawkesError::AdjacencyShape { expected, found: adjacency.dim() });
        }
        for (index, &value) in adjacency.indexed_iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(HawkesError::InvalidAdjacency { index, value });
            }
        }
        validate_end_time(end_time)?;
        Ok(Self { baseline, layout, decays, adjacency, end_time, seed })
    }

    pub fn n_nodes(&self) -> usize {
        self.baseline.nrows()
    }

    pub fn baseline(&self) -> &Array2<f64> {
        &self.baseline
    }

    pub fn decays(&self) -> &Array1<f64> {
        &self.decays
    }

    pub fn adjacency(&self) -> &Array3<f64> {
        &self.adjacency
    }

    pub fn period_length(&self) -> f64 {
        self.layout.period_length()
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// # Errors
    /// [`HawkesError::InvalidEndTime`] for a non-finite or non-positive value.
    pub fn set_end_time(&mut self, end_time: f64) -> HawkesResult<&mut Self> {
        validate_end_time(end_time)?;
        self.end_time = end_time;
        Ok(self)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn set_seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    /// Spectral radius of the branching matrix `(Σ_u α_iju)_{ij}`.
    pub fn spectral_radius(&self) -> f64 {
        spectral_radius(&self.adjacency)
    }

    /// Rescale the adjacency so the branching matrix has spectral radius
    /// `target`.
    ///
    /// # Errors
    /// [`HawkesError::InvalidSpectralRadius`] for a non-finite or
    /// non-positive target; [`HawkesError::ZeroSpectralRadius`] when the
    /// current adjacency cannot be rescaled.
    pub fn adjust_spectral_radius(&mut self, target: f64) -> HawkesResult<&mut Self> {
        if !target.is_finite() || target <= 0.0 {
            return Err(HawkesError::InvalidSpectralRadius { value: target });
        }
        let current = self.spectral_radius();
        if current == 0.0 {
            return Err(HawkesError::ZeroSpectralRadius);
        }
        self.adjacency *= target / current;
        Ok(self)
    }

    /// Simulate one realization on `[0, end_time)` with the stored seed.
    ///
    /// # Errors
    /// Only if the exponential sampler rejects its rate, which the bound
    /// check rules out in practice.
    pub fn simulate(&self) -> HawkesResult<HawkesRealization> {
        self.simulate_with_seed(self.seed)
    }

    fn simulate_with_seed(&self, seed: u64) -> HawkesResult<HawkesRealization> {
        let n_nodes = self.n_nodes();
        let n_decays = self.decays.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let max_baseline: Vec<f64> = self
            .baseline
            .rows()
            .into_iter()
            .map(|row| row.iter().copied().fold(0.0, f64::max))
            .collect();
        let mut g = Array2::<f64>::zeros((n_nodes, n_decays));
        let mut timestamps: Vec<Vec<f64>> = vec![Vec::new(); n_nodes];
        let mut intensities = vec![0.0; n_nodes];
        let mut t = 0.0;

        loop {
            let bound: f64 = (0..n_nodes).map(|i| max_baseline[i] + self.excitation(i, &g)).sum();
            if bound <= 0.0 {
                break;
            }
            let wait = rng.sample(Exp::new(bound)?);
            if t + wait >= self.end_time {
                break;
            }
            t += wait;
            for (u, mut column) in g.columns_mut().into_iter().enumerate() {
                column *= (-self.decays[u] * wait).exp();
            }

            let slot = self.layout.slot(t);
            for (i, lambda) in intensities.iter_mut().enumerate() {
                *lambda = self.baseline[[i, slot]] + self.excitation(i, &g);
            }
            let total: f64 = intensities.iter().sum();
            if rng.gen::<f64>() * bound >= total {
                continue;
            }
            let node = pick_node(&intensities, rng.gen::<f64>() * total);
            timestamps[node].push(t);
            let mut row = g.row_mut(node);
            row += &self.decays;
        }

        debug!(
            seed,
            n_jumps = timestamps.iter().map(Vec::len).sum::<usize>(),
            end_time = self.end_time,
            "Hawkes realization simulated"
        );
        HawkesRealization::new(timestamps.into_iter().map(Array1::from).collect(), self.end_time)
    }

    /// `Σ_{j,u} α_iju g_ju`.
    fn excitation(&self, node: usize, g: &Array2<f64>) -> f64 {
        let alpha = self.adjacency.index_axis(Axis(0), node);
        Zip::from(&alpha).and(g).fold(0.0, |acc, &a, &x| acc + a * x)
    }
}

/// Runs the same process several times with consecutive seeds.
#[derive(Debug, Clone, PartialEq)]
pub struct SimuHawkesMulti {
    simu: SimuHawkesSumExpKernels,
    n_simulations: usize,
}

impl SimuHawkesMulti {
    /// # Errors
    /// [`HawkesError::InvalidSimulationCount`] when `n_simulations == 0`.
    pub fn new(simu: SimuHawkesSumExpKernels, n_simulations: usize) -> HawkesResult<Self> {
        if n_simulations == 0 {
            return Err(HawkesError::InvalidSimulationCount { n_simulations });
        }
        Ok(Self { simu, n_simulations })
    }

    pub fn n_simulations(&self) -> usize {
        self.n_simulations
    }

    pub fn simu(&self) -> &SimuHawkesSumExpKernels {
        &self.simu
    }

    /// Simulate all runs in parallel; run `k` uses seed `seed + k`.
    ///
    /// # Errors
    /// The first error raised by a run.
    pub fn simulate(&self) -> HawkesResult<Vec<HawkesRealization>> {
        let base_seed = self.simu.seed();
        (0..self.n_simulations)
            .into_par_iter()
            .map(|k| self.simu.simulate_with_seed(base_seed.wrapping_add(k as u64)))
            .collect()
    }
}

fn validate_end_time(end_time: f64) -> HawkesResult<()> {
    if !end_time.is_finite() || end_time <= 0.0 {
        return Err(HawkesError::InvalidEndTime { value: end_time });
    }
    Ok(())
}

/// Index `i` such that `Σ_{l<i} w_l ≤ target < Σ_{l≤i} w_l`.
fn pick_node(weights: &[f64], target: f64) -> usize {
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if target < acc {
            return i;
        }
    }
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn two_node(end_time: f64, seed: u64) -> SimuHawkesSumExpKernels {
        let adjacency = Array3::from_shape_vec(
            (2, 2, 2),
            vec![0.0, 0.1, 0.2, 0.1, 0.3, 0.0, 0.0, 0.2],
        )
        .expect("valid shape");
        SimuHawkesSumExpKernels::new(
            array![[0.3, 0.6], [0.5, 0.2]],
            10.0,
            array![0.5, 2.0],
            adjacency,
            end_time,
            seed,
        )
        .expect("valid process")
    }

    #[test]
    fn construction_validates_shapes() {
        let err = SimuHawkesSumExpKernels::new(
            array![[0.3, 0.6], [0.5, 0.2]],
            10.0,
            array![1.0],
            Array3::zeros((2, 2, 2)),
            10.0,
            0,
        );

        assert!(matches!(
            err,
            Err(HawkesError::AdjacencyShape { expected: (2, 2, 1), found: (2, 2, 2) })
        ));
    }

    #[test]
    fn same_seed_same_realization() {
        let a = two_node(200.0, 7).simulate().expect("simulation");
        let b = two_node(200.0, 7).simulate().expect("simulation");
        let c = two_node(200.0, 8).simulate().expect("simulation");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.n_jumps() > 0);
    }

    #[test]
    fn adjust_spectral_radius_hits_target() {
        let mut simu = two_node(10.0, 0);

        simu.adjust_spectral_radius(0.5).expect("rescalable");

        assert_abs_diff_eq!(simu.spectral_radius(), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn zero_adjacency_cannot_be_rescaled() {
        let mut simu = SimuHawkesSumExpKernels::new(
            array![[1.0]],
            1.0,
            array![1.0],
            Array3::zeros((1, 1, 1)),
            10.0,
            0,
        )
        .expect("valid process");

        assert_eq!(simu.adjust_spectral_radius(0.5).err(), Some(HawkesError::ZeroSpectralRadius));
        assert!(matches!(
            simu.adjust_spectral_radius(-1.0),
            Err(HawkesError::InvalidSpectralRadius { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // A stationary univariate Hawkes process with baseline μ and branching
    // ratio α has mean intensity μ / (1 − α); the simulated jump count
    // should be close to that times the horizon.
    fn jump_count_matches_stationary_mean_intensity() {
        let end_time = 20_000.0;
        let simu = SimuHawkesSumExpKernels::new(
            array![[1.0]],
            1.0,
            array![2.0],
            Array3::from_elem((1, 1, 1), 0.5),
            end_time,
            2093,
        )
        .expect("valid process");

        let n = simu.simulate().expect("simulation").n_jumps() as f64;

        let expected = end_time * 1.0 / (1.0 - 0.5);
        assert!((n - expected).abs() / expected < 0.05, "n = {n}, expected ≈ {expected}");
    }

    #[test]
    fn multi_uses_consecutive_seeds() {
        let multi = SimuHawkesMulti::new(two_node(100.0, 11), 3).expect("valid count");

        let runs = multi.simulate().expect("simulation");

        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1], two_node(100.0, 12).simulate().expect("simulation"));
        assert!(matches!(
            SimuHawkesMulti::new(two_node(1.0, 0), 0),
            Err(HawkesError::InvalidSimulationCount { n_simulations: 0 })
        ));
    }
}
