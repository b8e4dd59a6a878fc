//! optimization — first-order solvers, penalties, and a unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer used to fit models: an argmin-backed BFGS
//! solver and a proximal SGD solver (`solver`), penalties with closed-form
//! proximal operators (`prox`), vector kernels shared by the solvers
//! (`vector_ops`), a least-squares reference model (`linreg`), and a single
//! error/result surface (`errors`).
//!
//! Key behaviors
//! -------------
//! - Callers implement [`solver::Model`] (or [`solver::StochasticModel`] for
//!   SGD), pick a [`prox::Prox`], and receive the minimizer together with
//!   its history.
//! - Configuration issues, numerical failures, model failures and argmin
//!   errors all normalize into [`errors::OptError`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Solvers minimize `loss(x) + prox(x)`; models report the loss only.
//! - Inputs are validated at the boundary (options at construction, starting
//!   points on `solve`); invalid states are reported as `OptError`, not
//!   panics.
//!
//! Conventions
//! -----------
//! - Vectors are `ndarray::Array1<f64>` (`Coeffs`, `Grad`).
//! - Progress is reported through `tracing` when a solver's history policy
//!   is verbose; nothing is printed directly.
//!
//! Testing notes
//! -------------
//! - Unit tests next to each submodule cover local behavior (prox closed
//!   forms, tolerance validation, history periods, solver wiring).
//! - `tests/integration_bfgs_pipeline.rs` runs both solvers end to end on
//!   regularized regression.

pub mod errors;
pub mod linreg;
pub mod prox;
pub mod solver;
pub mod vector_ops;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use hawkes_optim::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::linreg::ModelLinReg;
    pub use super::prox::{Prox, ProxKind, ProxL1, ProxL2Sq, ProxPositive, ProxZero};
    pub use super::solver::prelude::*;
}
