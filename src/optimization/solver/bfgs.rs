//! solver::bfgs — BFGS solver with a pluggable model and smooth penalty.
//!
//! Purpose
//! -------
//! Minimize `f(x) = model.loss(x) + prox.value(x)` with argmin's BFGS. The
//! solver owns configuration, the attached model and penalty, the recorded
//! history, and the result of the last run.
//!
//! Key behaviors
//! -------------
//! - [`Bfgs::set_prox`] validates the penalty kind up front: only `ProxZero`
//!   and (non-positive) `ProxL2Sq` have a gradient BFGS can use. Anything
//!   else fails with [`OptError::UnsupportedProx`] and leaves the solver
//!   unchanged.
//! - [`Bfgs::solve`] defaults the starting point to zeros, runs argmin with
//!   an identity inverse Hessian, records history through
//!   [`HistoryObserver`], and stores the solution and [`SolveOutcome`].
//!   Results of the previous run are cleared first, so a failed solve
//!   leaves every accessor empty.
//!
//! Invariants & assumptions
//! ------------------------
//! - The returned solution has exactly `model.n_coeffs()` entries.
//! - Model and penalty are borrowed for the solver's lifetime; the solver
//!   never mutates them.
use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::optimization::{
    errors::{OptError, OptResult},
    prox::Prox,
    solver::{
        adapter::{ObjectiveAdapter, ProxGradient},
        builders::{build_bfgs_hager_zhang, build_bfgs_more_thuente},
        history::{History, HistoryObserver},
        run::run_bfgs,
        traits::{BfgsOptions, LineSearcher, Model, SolveOutcome},
        types::{Coeffs, Grad},
        validation::validate_coeffs,
    },
};

const SOLVER_NAME: &str = "BFGS";

pub struct Bfgs<'a> {
    options: BfgsOptions,
    model: Option<&'a dyn Model>,
    prox: Option<&'a dyn Prox>,
    prox_grad: Option<ProxGradient>,
    history: History,
    solution: Option<Coeffs>,
    outcome: Option<SolveOutcome>,
    time_start: Option<DateTime<Local>>,
    time_end: Option<DateTime<Local>>,
    time_elapsed: Option<f64>,
}

impl<'a> Bfgs<'a> {
    pub fn new(options: BfgsOptions) -> Self {
        Self {
            options,
            model: None,
            prox: None,
            prox_grad: None,
            history: History::default(),
            solution: None,
            outcome: None,
            time_start: None,
            time_end: None,
            time_elapsed: None,
        }
    }

    pub fn set_model(&mut self, model: &'a dyn Model) -> &mut Self {
        self.model = Some(model);
        self
    }

    /// Attach a penalty and install its gradient correction.
    ///
    /// # Errors
    /// [`OptError::UnsupportedProx`] for `ProxL1`, `ProxPositive` and
    /// `ProxL2Sq` with a positivity constraint.
    pub fn set_prox(&mut self, prox: &'a dyn Prox) -> OptResult<&mut Self> {
        let prox_grad = ProxGradient::for_kind(SOLVER_NAME, prox.kind())?;
        self.prox = Some(prox);
        self.prox_grad = Some(prox_grad);
        Ok(self)
    }

    fn adapter(&self) -> OptResult<ObjectiveAdapter<'a>> {
        let model = self.model.ok_or(OptError::ModelNotSet)?;
        let prox = self.prox.ok_or(OptError::ProxNotSet)?;
        let prox_grad = self.prox_grad.ok_or(OptError::ProxNotSet)?;
        Ok(ObjectiveAdapter::new(model, prox, prox_grad))
    }

    /// `loss(x) + prox.value(x)`.
    ///
    /// # Errors
    /// Missing model/prox, model errors, or a non-finite value.
    pub fn objective(&self, coeffs: &Coeffs) -> OptResult<f64> {
        self.adapter()?.objective(coeffs)
    }

    /// Gradient correction contributed by the penalty at `coeffs`.
    ///
    /// # Errors
    /// [`OptError::ProxNotSet`] before [`Bfgs::set_prox`].
    pub fn prox_grad(&self, coeffs: &Coeffs) -> OptResult<Grad> {
        let prox_grad = self.prox_grad.ok_or(OptError::ProxNotSet)?;
        Ok(prox_grad.apply(coeffs))
    }

    /// Minimize the objective starting from `x0` (zeros when `None`).
    ///
    /// # Errors
    /// - [`OptError::ModelNotSet`] / [`OptError::ProxNotSet`].
    /// - [`OptError::CoeffsDimMismatch`] / [`OptError::InvalidCoeffs`] for a bad `x0`.
    /// - Model, line-search and backend failures raised while iterating.
    pub fn solve(&mut self, x0: Option<Coeffs>) -> OptResult<Coeffs> {
        self.reset_run();
        let problem = self.adapter()?;
        let n_coeffs = problem.model.n_coeffs();
        let x0 = match x0 {
            Some(x) => {
                validate_coeffs(&x, n_coeffs)?;
                x
            }
            None => Coeffs::zeros(n_coeffs),
        };
        let obj0 = problem.objective(&x0)?;

        self.time_start = Some(Local::now());
        let clock = Instant::now();
        let history = Arc::new(Mutex::new(History::default()));
        let observer =
            HistoryObserver::new(Arc::clone(&history), self.options.history, x0.clone(), obj0);

        let outcome = match self.options.line_searcher {
            LineSearcher::MoreThuente => {
                let solver = build_bfgs_more_thuente(&self.options)?;
                run_bfgs(x0, &self.options, problem, solver, observer)
            }
            LineSearcher::HagerZhang => {
                let solver = build_bfgs_hager_zhang(&self.options)?;
                run_bfgs(x0, &self.options, problem, solver, observer)
            }
        }?;

        self.time_end = Some(Local::now());
        self.time_elapsed = Some(clock.elapsed().as_secs_f64());
        self.history = match Arc::try_unwrap(history) {
            Ok(mutex) => mutex.into_inner().map_err(|_| OptError::HistoryUnavailable)?,
            Err(shared) => shared.lock().map_err(|_| OptError::HistoryUnavailable)?.clone(),
        };
        debug!(
            iterations = outcome.iterations,
            value = outcome.value,
            status = %outcome.status,
            "BFGS finished"
        );

        let solution = outcome.solution.clone();
        self.solution = Some(solution.clone());
        self.outcome = Some(outcome);
        Ok(solution)
    }

    // A failed solve must not leave results of an earlier run behind.
    fn reset_run(&mut self) {
        self.history = History::default();
        self.solution = None;
        self.outcome = None;
        self.time_start = None;
        self.time_end = None;
        self.time_elapsed = None;
    }

    pub fn options(&self) -> &BfgsOptions {
        &self.options
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn solution(&self) -> Option<&Coeffs> {
        self.solution.as_ref()
    }

    pub fn outcome(&self) -> Option<&SolveOutcome> {
        self.outcome.as_ref()
    }

    pub fn time_start(&self) -> Option<DateTime<Local>> {
        self.time_start
    }

    pub fn time_end(&self) -> Option<DateTime<Local>> {
        self.time_end
    }

    /// Duration of the last `solve`, in seconds.
    pub fn time_elapsed(&self) -> Option<f64> {
        self.time_elapsed
    }
}
