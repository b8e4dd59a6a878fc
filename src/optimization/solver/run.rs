//! Execution helper that runs an argmin BFGS solver on an objective and
//! returns a crate-friendly [`SolveOutcome`].
use crate::optimization::{
    errors::OptResult,
    solver::{
        adapter::ObjectiveAdapter,
        history::HistoryObserver,
        traits::{BfgsOptions, SolveOutcome},
        types::{BfgsState, Coeffs, InvHessian},
    },
};
use argmin::core::{observers::ObserverMode, Executor, State};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Run a BFGS optimization for an objective.
///
/// Wires up:
/// - the objective via [`ObjectiveAdapter`],
/// - the chosen solver (BFGS with Hager–Zhang or More–Thuente),
/// - the starting point `x0` and an identity inverse Hessian,
/// - the history observer (always attached; it decides what to record),
/// - the slog observer when the `obs_slog` feature is on and `verbose` is set,
/// - the optional iteration cap,
///
/// then executes the solver and converts the final state into a
/// [`SolveOutcome`].
///
/// # Errors
/// - Propagates any argmin runtime error (line-search failures, model
///   errors raised inside the cost function, etc.).
/// - Propagates validation errors when building the [`SolveOutcome`].
pub fn run_bfgs<'a, S>(
    x0: Coeffs, opts: &BfgsOptions, problem: ObjectiveAdapter<'a>, solver: S,
    observer: HistoryObserver,
) -> OptResult<SolveOutcome>
where
    S: argmin::core::Solver<ObjectiveAdapter<'a>, BfgsState> + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.history.verbose {
        log_initial_state(&x0, &problem)?;
    }
    let inv_hessian = InvHessian::eye(x0.len());
    let mut optimizer = Executor::new(problem, solver)
        .configure(|state| state.param(x0).inv_hessian(inv_hessian))
        .add_observer(observer, ObserverMode::Always);
    #[cfg(feature = "obs_slog")]
    if opts.history.verbose {
        let slog = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(slog, ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    SolveOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state(x0: &Coeffs, problem: &ObjectiveAdapter<'_>) -> OptResult<()> {
    let f0 = problem.cost(x0)?;
    let g0n = problem.gradient(x0).ok().map(|g| g.l2_norm());

    tracing::debug!(f0, grad_norm = ?g0n, "BFGS initial state");
    Ok(())
}
