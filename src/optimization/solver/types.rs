//! solver::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the core numeric types and argmin solver aliases used by the
//! first-order solvers. The rest of the optimization code refers to these
//! names instead of spelling out `ndarray` and argmin generics.
//!
//! Invariants & assumptions
//! ------------------------
//! - All vectors and matrices are `ndarray` containers over `f64`.
//! - `Cost` is the value of the full objective `f(x) = loss(x) + prox(x)`;
//!   no sign flip happens anywhere in this crate (we always minimize).
//! - The line-search aliases assume argmin's three-parameter forms
//!   `(Param, Gradient, Float)` as of the pinned argmin version.
//!
//! Conventions
//! -----------
//! - `Coeffs` and `Grad` have length `model.n_coeffs()`.
//! - `InvHessian` is the dense `n × n` inverse-Hessian approximation that
//!   BFGS carries in its iteration state; it starts as the identity.
use argmin::core::IterState;
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::BFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Coefficient vector `x` being optimized.
pub type Coeffs = Array1<f64>;

/// Gradient vector `∇f(x)`, same shape as [`Coeffs`].
pub type Grad = Array1<f64>;

/// Dense inverse-Hessian approximation used by BFGS.
pub type InvHessian = Array2<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Function-evaluation counters as reported by argmin.
///
/// Maps counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Iteration state carried by the BFGS executor.
pub type BfgsState = IterState<Coeffs, Grad, (), InvHessian, (), Cost>;

/// Hager–Zhang line search specialized to this crate's numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Coeffs, Grad, Cost>;

/// More–Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Coeffs, Grad, Cost>;

/// BFGS wired to the Hager–Zhang line search.
pub type BfgsHagerZhang = BFGS<HagerZhangLS, Cost>;

/// BFGS wired to the More–Thuente line search.
pub type BfgsMoreThuente = BFGS<MoreThuenteLS, Cost>;

/// Default iteration cap for BFGS.
pub const DEFAULT_MAX_ITER: usize = 100;

/// Default history printing period.
pub const DEFAULT_PRINT_EVERY: usize = 10;

/// Default history recording period.
pub const DEFAULT_RECORD_EVERY: usize = 1;
