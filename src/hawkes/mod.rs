//! hawkes — Hawkes process data, least-squares estimation, and simulation.
//!
//! Purpose
//! -------
//! Provide the point-process side of the crate: validated realizations
//! ([`data`]), sum-of-exponentials kernels with a periodic baseline
//! ([`kernels`]), the least-squares contrast used for estimation
//! ([`model`]), and a thinning simulator ([`simulation`]).
//!
//! Key behaviors
//! -------------
//! - [`ModelHawkesSumExpKernLeastSq`] implements the optimizer's `Model`
//!   trait, so it plugs straight into `Bfgs` with `ProxZero` or `ProxL2Sq`.
//! - Weight computation runs on a dedicated rayon pool sized by the model's
//!   `n_threads`; multi-realization simulation runs on the global pool.
//! - Errors surface as [`HawkesError`] and convert into `OptError` when they
//!   travel through a solver.
//!
//! Invariants & assumptions
//! ------------------------
//! - Realizations passed to one model share their node count.
//! - Decays are fixed (not estimated); only baselines and adjacency are.
//!
//! Downstream usage
//! ----------------
//! 1. Simulate with [`SimuHawkesMulti`] or build [`HawkesRealization`]s from
//!    observed timestamps.
//! 2. `ModelHawkesSumExpKernLeastSq::new(decays, n_baselines, period_length,
//!    n_threads)` then `fit(realizations)`.
//! 3. Minimize with `optimization::solver::Bfgs`.
pub mod data;
pub mod errors;
pub mod kernels;
pub mod model;
pub mod simulation;

pub use self::data::HawkesRealization;
pub use self::errors::{HawkesError, HawkesResult};
pub use self::model::{LeastSqWeights, ModelHawkesSumExpKernLeastSq};
pub use self::simulation::{SimuHawkesMulti, SimuHawkesSumExpKernels};

pub mod prelude {
    pub use super::data::HawkesRealization;
    pub use super::errors::{HawkesError, HawkesResult};
    pub use super::model::ModelHawkesSumExpKernLeastSq;
    pub use super::simulation::{SimuHawkesMulti, SimuHawkesSumExpKernels};
}
