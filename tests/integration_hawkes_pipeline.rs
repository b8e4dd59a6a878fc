//! Integration tests for Hawkes simulation and least-squares estimation.
//!
//! Purpose
//! -------
//! - Validate the simulate-then-fit pipeline: thinning simulation,
//!   least-squares weights, and minimization of the contrast with BFGS.
//!
//! Coverage
//! --------
//! - `hawkes::simulation`: multi-realization runs with a spectral-radius
//!   adjustment.
//! - `hawkes::model`: fitting, `n_coeffs`, and use as an optimizer `Model`.
//! - `optimization::solver::Bfgs` with `ProxZero` and `ProxL2Sq`.
//!
//! Exclusions
//! ----------
//! - Exactness of the weights against numerical integration and gradient
//!   checks; these are covered by unit tests in `hawkes::model`.
use hawkes_optim::{
    hawkes::{HawkesError, ModelHawkesSumExpKernLeastSq, SimuHawkesMulti, SimuHawkesSumExpKernels},
    optimization::{
        errors::OptError,
        prox::{ProxL2Sq, ProxZero},
        solver::{Bfgs, BfgsOptions, HistoryPolicy, LineSearcher, Model, Tolerances},
    },
};
use ndarray::{array, Array3};

fn quiet_options() -> BfgsOptions {
    BfgsOptions::new(
        Tolerances::new(Some(1e-8), None, Some(300)).expect("valid tolerances"),
        LineSearcher::MoreThuente,
        HistoryPolicy::new(false, 10, 1).expect("valid policy"),
    )
}

/// Purpose
/// -------
/// Univariate process with a constant baseline (one slot) and a single
/// exponential kernel, simulated four times on a long horizon.
fn univariate_realizations() -> Vec<hawkes_optim::hawkes::HawkesRealization> {
    let simu = SimuHawkesSumExpKernels::new(
        array![[0.8]],
        10.0,
        array![3.0],
        Array3::from_elem((1, 1, 1), 0.4),
        5_000.0,
        2093,
    )
    .expect("valid process");
    SimuHawkesMulti::new(simu, 4)
        .expect("valid simulation count")
        .simulate()
        .expect("simulation should succeed")
}

#[test]
// Purpose
// -------
// Minimizing the least-squares contrast recovers the generating parameters
// of a univariate process.
//
// Given
// -----
// - Four realizations of a process with μ = 0.8, α = 0.4, β = 3 on [0, 5000).
// - BFGS with `ProxZero`, starting at zeros.
//
// Expect
// ------
// - The solution has `n_coeffs = 2` entries.
// - The contrast at the solution is no larger than at the true parameters.
// - Both estimates lie within 0.15 of the truth.
fn least_squares_recovers_univariate_parameters() {
    let mut model = ModelHawkesSumExpKernLeastSq::new(array![3.0], 1, 10.0, 2)
        .expect("valid configuration");
    model.fit(univariate_realizations()).expect("fit should succeed");
    let truth = array![0.8, 0.4];

    let mut solver = Bfgs::new(quiet_options());
    solver.set_model(&model).set_prox(&ProxZero).expect("zero prox is supported");
    let x = solver.solve(None).expect("BFGS should minimize a convex quadratic");

    assert_eq!(x.len(), model.n_coeffs());
    let at_solution = model.loss(&x).expect("loss at solution");
    let at_truth = model.loss(&truth).expect("loss at truth");
    assert!(at_solution <= at_truth + 1e-9, "{at_solution} > {at_truth}");
    assert!((x[0] - 0.8).abs() < 0.15, "baseline estimate {}", x[0]);
    assert!((x[1] - 0.4).abs() < 0.15, "adjacency estimate {}", x[1]);
}

#[test]
// Purpose
// -------
// The benchmark configuration (2 nodes, 6 baseline slots, 3 decays) runs
// end to end at a small horizon, and the weights do not depend on the
// number of worker threads.
//
// Given
// -----
// - Baselines, decays and adjacency of the varying-baseline benchmark,
//   rescaled to spectral radius 0.5, simulated 4 times on [0, 3000).
//
// Expect
// ------
// - `n_coeffs = 2·6 + 2·2·3 = 24`.
// - Identical weights with 1 and 4 threads.
// - A ridge-penalized BFGS fit returns a finite vector of that length.
fn varying_baseline_pipeline_runs_end_to_end() {
    let adjacency = Array3::from_shape_vec(
        (2, 2, 3),
        vec![0.0, 0.1, 0.4, 0.2, 0.0, 0.2, 0.0, 0.0, 0.0, 0.6, 0.3, 0.0],
    )
    .expect("valid shape");
    let mut simu = SimuHawkesSumExpKernels::new(
        array![[0.3, 0.5, 0.6, 0.4, 0.2, 0.0], [0.8, 0.5, 0.2, 0.3, 0.3, 0.4]],
        300.0,
        array![0.5, 2.0, 6.0],
        adjacency,
        3_000.0,
        2093,
    )
    .expect("valid process");
    simu.adjust_spectral_radius(0.5).expect("rescalable adjacency");
    let realizations = SimuHawkesMulti::new(simu, 4)
        .expect("valid simulation count")
        .simulate()
        .expect("simulation should succeed");

    let mut single = ModelHawkesSumExpKernLeastSq::new(array![0.5, 2.0, 6.0], 6, 300.0, 1)
        .expect("valid configuration");
    single.fit(realizations.clone()).expect("fit should succeed");
    let mut pooled = ModelHawkesSumExpKernLeastSq::new(array![0.5, 2.0, 6.0], 6, 300.0, 4)
        .expect("valid configuration");
    pooled.fit(realizations).expect("fit should succeed");

    assert_eq!(single.n_coeffs(), 24);
    assert_eq!(single.weights(), pooled.weights());

    let ridge = ProxL2Sq::new(1e-3).expect("valid strength");
    let mut solver = Bfgs::new(quiet_options());
    solver.set_model(&pooled).set_prox(&ridge).expect("ridge is supported");
    let x = solver.solve(None).expect("BFGS should minimize a convex quadratic");

    assert_eq!(x.len(), 24);
    assert!(x.iter().all(|v| v.is_finite()));
}

#[test]
// Purpose
// -------
// Using the model before `fit` surfaces as a solver error rather than a
// panic.
//
// Given
// -----
// - An unfitted model (zero coefficients) attached to BFGS.
//
// Expect
// ------
// - `solve` fails with `OptError::ModelNotFitted`.
// - `fit` on an empty list fails with `HawkesError::NoRealizations`.
fn unfitted_model_fails_cleanly() {
    let mut model =
        ModelHawkesSumExpKernLeastSq::new(array![1.0], 1, 1.0, 1).expect("valid configuration");
    {
        let mut solver = Bfgs::new(quiet_options());
        solver.set_model(&model).set_prox(&ProxZero).expect("zero prox is supported");
        assert_eq!(solver.solve(None), Err(OptError::ModelNotFitted));
    }

    assert!(matches!(model.fit(Vec::new()), Err(HawkesError::NoRealizations)));
}
