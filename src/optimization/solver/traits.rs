//! Public API surface for the first-order solvers.
//!
//! - [`Model`]: differentiable loss users implement for their problem.
//! - [`StochasticModel`] / [`GeneralizedLinearModel`]: per-sample access
//!   needed by SGD.
//! - [`BfgsOptions`] and [`Tolerances`]: configuration for BFGS.
//! - [`LineSearcher`]: choice of line search used by BFGS.
//! - [`SolveOutcome`]: normalized result returned by the solvers.
//!
//! Convention: solvers *minimize* `f(x) = loss(x) + prox(x)`. Models return
//! the loss and its gradient; the penalty part is owned by the prox.
use crate::optimization::{
    errors::{OptError, OptResult},
    solver::{
        types::{
            Coeffs, Cost, DEFAULT_MAX_ITER, DEFAULT_PRINT_EVERY, DEFAULT_RECORD_EVERY, FnEvalMap,
            Grad,
        },
        validation::{
            validate_solution, validate_value, verify_frequency, verify_tol_cost, verify_tol_grad,
        },
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use ndarray::ArrayView1;
use std::str::FromStr;

/// User-implemented differentiable model.
///
/// Required:
/// - `n_coeffs() -> usize`: dimension of the coefficient vector.
/// - `loss(&Coeffs) -> OptResult<Cost>`: evaluate the loss at `x`.
///
/// Optional:
/// - `grad(&Coeffs) -> OptResult<Grad>`: analytic gradient of the loss. If
///   not implemented, finite differences of the full objective are used.
pub trait Model {
    fn n_coeffs(&self) -> usize;
    fn loss(&self, coeffs: &Coeffs) -> OptResult<Cost>;

    fn grad(&self, _coeffs: &Coeffs) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// A model whose loss is an average of per-sample losses.
pub trait StochasticModel: Model {
    fn n_samples(&self) -> usize;

    /// Gradient of the `i`-th sample loss, written into `out`.
    fn grad_i(&self, i: usize, coeffs: &Coeffs, out: &mut Grad) -> OptResult<()>;

    /// Views this model as a GLM when it is one; enables batched SGD.
    fn as_glm(&self) -> Option<&dyn GeneralizedLinearModel> {
        None
    }
}

/// Models whose per-sample gradient is `factor_i(x) · features_i`.
pub trait GeneralizedLinearModel: StochasticModel {
    fn features(&self, i: usize) -> ArrayView1<'_, f64>;
    fn grad_i_factor(&self, i: usize, coeffs: &Coeffs) -> OptResult<f64>;
}

/// Choice of line search used inside BFGS.
///
/// Parsing is case-insensitive (`"MoreThuente"`, `"HagerZhang"`); unknown
/// names return `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration limits used by BFGS.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in objective falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// `None` tolerances leave argmin's defaults in place. At least one of the
/// three must be provided (see [`Tolerances::new`]).
///
/// A zero tolerance is rejected rather than read as "never stop early". To
/// run up to `n` iterations, use `Tolerances::new(None, None, Some(n))`:
/// only argmin's machine-precision defaults can end the run before `n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for bad tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol_grad: None, tol_cost: None, max_iter: Some(DEFAULT_MAX_ITER) }
    }
}

/// How often the solver records and prints its history.
///
/// A record is kept when `n_iter % record_every == 0`; when `verbose`, a
/// line is logged when `n_iter % print_every == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPolicy {
    pub verbose: bool,
    pub print_every: usize,
    pub record_every: usize,
}

impl HistoryPolicy {
    /// # Errors
    /// [`OptError::InvalidFrequency`] if either period is zero.
    pub fn new(verbose: bool, print_every: usize, record_every: usize) -> OptResult<Self> {
        verify_frequency("print_every", print_every)?;
        verify_frequency("record_every", record_every)?;
        Ok(Self { verbose, print_every, record_every })
    }
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self { verbose: true, print_every: DEFAULT_PRINT_EVERY, record_every: DEFAULT_RECORD_EVERY }
    }
}

/// BFGS configuration.
///
/// Default:
/// - `tols`: argmin's default tolerances, `max_iter = 100`
/// - `line_searcher`: `MoreThuente`
/// - `history`: verbose, print every 10, record every iteration
#[derive(Debug, Clone, PartialEq)]
pub struct BfgsOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub history: HistoryPolicy,
}

impl BfgsOptions {
    pub fn new(tols: Tolerances, line_searcher: LineSearcher, history: HistoryPolicy) -> Self {
        Self { tols, line_searcher, history }
    }
}

impl Default for BfgsOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::default(),
            line_searcher: LineSearcher::MoreThuente,
            history: HistoryPolicy::default(),
        }
    }
}

/// Canonical result returned by the solvers.
///
/// - `solution`: best coefficient vector found.
/// - `value`: objective `f(solution)`.
/// - `converged`: `true` when the solver met a convergence criterion
///   (as opposed to running out of iterations).
/// - `status`: human-readable termination status.
/// - `iterations`: number of iterations performed.
/// - `fn_evals`: function-evaluation counters.
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub solution: Coeffs,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl SolveOutcome {
    /// Build a validated [`SolveOutcome`] from raw argmin state.
    ///
    /// # Errors
    /// Propagates validation errors for `solution` or `value`.
    pub fn new(
        solution: Option<Coeffs>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let solution = validate_solution(solution)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                (converged, format!("{reason:?}"))
            }
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            solution,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn line_searcher_parses_case_insensitively() {
        assert_eq!("morethuente".parse::<LineSearcher>(), Ok(LineSearcher::MoreThuente));
        assert_eq!("HAGERZHANG".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert!(matches!(
            "backtracking".parse::<LineSearcher>(),
            Err(OptError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    fn tolerances_require_at_least_one_criterion() {
        assert_eq!(Tolerances::new(None, None, None), Err(OptError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(OptError::InvalidMaxIter { .. })
        ));
        assert!(Tolerances::new(Some(1e-6), None, None).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // A zero tolerance is refused; an iteration cap alone is the way to run
    // up to `n` iterations.
    fn zero_tolerance_is_rejected_and_cap_alone_is_accepted() {
        assert!(matches!(
            Tolerances::new(Some(0.0), None, Some(50)),
            Err(OptError::InvalidTolGrad { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, Some(0.0), Some(50)),
            Err(OptError::InvalidTolCost { .. })
        ));
        assert_eq!(
            Tolerances::new(None, None, Some(50)),
            Ok(Tolerances { tol_grad: None, tol_cost: None, max_iter: Some(50) })
        );
    }

    #[test]
    fn history_policy_rejects_zero_periods() {
        assert_eq!(
            HistoryPolicy::new(true, 0, 1),
            Err(OptError::InvalidFrequency { name: "print_every", value: 0 })
        );
        assert_eq!(
            HistoryPolicy::new(true, 1, 0),
            Err(OptError::InvalidFrequency { name: "record_every", value: 0 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Hitting the iteration cap is reported as terminated but not converged.
    fn outcome_distinguishes_convergence_from_iteration_cap() {
        let capped = SolveOutcome::new(
            Some(array![1.0]),
            0.5,
            TerminationStatus::Terminated(TerminationReason::MaxItersReached),
            10,
            FnEvalMap::new(),
            Some(array![3.0, 4.0]),
        )
        .expect("outcome should be valid");
        assert!(!capped.converged);
        assert_eq!(capped.grad_norm, Some(5.0));

        let converged = SolveOutcome::new(
            Some(array![1.0]),
            0.5,
            TerminationStatus::Terminated(TerminationReason::SolverConverged),
            3,
            FnEvalMap::new(),
            None,
        )
        .expect("outcome should be valid");
        assert!(converged.converged);
        assert_eq!(converged.iterations, 3);
    }
}
