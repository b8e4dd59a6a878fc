//! solver::builders — BFGS construction helpers.
//!
//! Purpose
//! -------
//! Provide small builders for argmin's BFGS with either Hager–Zhang or
//! More–Thuente line search. They hide argmin's generic wiring and apply the
//! crate-level tolerances, leaving the starting point, the inverse-Hessian
//! seed and the iteration cap to the runner.
//!
//! Conventions
//! -----------
//! - When a tolerance is `None`, the corresponding `with_tolerance_*` is not
//!   called and argmin's default stays in effect.
//! - Errors are reported via [`OptResult`]; `argmin::core::Error` never
//!   crosses this module boundary.
use argmin::solver::quasinewton::BFGS;

use crate::optimization::{
    errors::OptResult,
    solver::{
        traits::BfgsOptions,
        types::{BfgsHagerZhang, BfgsMoreThuente, Cost, HagerZhangLS, MoreThuenteLS},
    },
};

/// Construct BFGS with Hager–Zhang line search and the configured tolerances.
///
/// # Errors
/// Returned when argmin rejects a tolerance.
pub fn build_bfgs_hager_zhang(opts: &BfgsOptions) -> OptResult<BfgsHagerZhang> {
    let bfgs = BfgsHagerZhang::new(HagerZhangLS::new());
    configure_bfgs(bfgs, opts)
}

/// Construct BFGS with More–Thuente line search and the configured tolerances.
///
/// # Errors
/// Returned when argmin rejects a tolerance.
pub fn build_bfgs_more_thuente(opts: &BfgsOptions) -> OptResult<BfgsMoreThuente> {
    let bfgs = BfgsMoreThuente::new(MoreThuenteLS::new());
    configure_bfgs(bfgs, opts)
}

/// Apply optional gradient and cost tolerances to a BFGS solver, whatever
/// its line search.
pub fn configure_bfgs<L>(mut solver: BFGS<L, Cost>, opts: &BfgsOptions) -> OptResult<BFGS<L, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}
