//! Adapter that exposes a `(Model, Prox)` pair as an `argmin` problem.
//!
//! The objective handed to argmin is `f(x) = model.loss(x) + prox.value(x)`
//! and its gradient is `model.grad(x) + correction(x)`, where the correction
//! is the analytic gradient of the penalty (see [`ProxGradient`]). If the
//! model does not provide a gradient, we finite-difference the full objective.
use std::cell::RefCell;

use crate::optimization::{
    errors::{OptError, OptResult},
    prox::{Prox, ProxKind},
    solver::{
        traits::Model,
        types::{Coeffs, Cost, Grad},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Analytic gradient of a smooth penalty.
///
/// Only the two penalties BFGS supports have one:
/// - `Zero`: the zero vector;
/// - `L2Sq { strength }`: `strength · x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProxGradient {
    Zero,
    L2Sq { strength: f64 },
}

impl ProxGradient {
    /// Select the gradient correction for a penalty, or reject it.
    ///
    /// # Errors
    /// [`OptError::UnsupportedProx`] for any kind other than `Zero` and
    /// non-positive `L2Sq`.
    pub fn for_kind(solver: &'static str, kind: ProxKind) -> OptResult<Self> {
        match kind {
            ProxKind::Zero => Ok(ProxGradient::Zero),
            ProxKind::L2Sq { strength, positive: false } => Ok(ProxGradient::L2Sq { strength }),
            ProxKind::L2Sq { positive: true, .. } => Err(OptError::UnsupportedProx {
                solver,
                prox: "ProxL2Sq with positivity constraint".to_string(),
            }),
            other => Err(OptError::UnsupportedProx { solver, prox: other.name().to_string() }),
        }
    }

    pub fn apply(&self, coeffs: &Coeffs) -> Grad {
        match self {
            ProxGradient::Zero => Grad::zeros(coeffs.len()),
            ProxGradient::L2Sq { strength } => coeffs * *strength,
        }
    }
}

/// Bridges a model and a smooth penalty to `argmin`'s `CostFunction` and
/// `Gradient`.
pub struct ObjectiveAdapter<'a> {
    pub model: &'a dyn Model,
    pub prox: &'a dyn Prox,
    pub prox_grad: ProxGradient,
}

impl<'a> ObjectiveAdapter<'a> {
    pub fn new(model: &'a dyn Model, prox: &'a dyn Prox, prox_grad: ProxGradient) -> Self {
        Self { model, prox, prox_grad }
    }

    /// Evaluate `loss(x) + prox(x)`.
    ///
    /// # Errors
    /// Propagates model errors; returns [`OptError::NonFiniteCost`] if the
    /// sum is not finite.
    pub fn objective(&self, coeffs: &Coeffs) -> OptResult<Cost> {
        let value = self.model.loss(coeffs)? + self.prox.value(coeffs);
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value });
        }
        Ok(value)
    }
}

impl CostFunction for ObjectiveAdapter<'_> {
    type Param = Coeffs;
    type Output = Cost;

    fn cost(&self, coeffs: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.objective(coeffs)?)
    }
}

impl Gradient for ObjectiveAdapter<'_> {
    type Param = Coeffs;
    type Gradient = Grad;

    /// Evaluate `∇f(x)`.
    ///
    /// Behavior:
    /// - If the model implements `grad`, validate it and add the penalty
    ///   correction.
    /// - Otherwise compute a finite-difference gradient of the full
    ///   objective: central differences first, forward differences when a
    ///   cost evaluation failed or the central result is not finite.
    ///
    /// The FD closure must return `f64`, so the first error raised inside it
    /// is parked in `closure_err` and `NaN` is returned instead.
    fn gradient(&self, coeffs: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = coeffs.len();
        match self.model.grad(coeffs) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(g + self.prox_grad.apply(coeffs))
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |x: &Coeffs| -> f64 {
                    match self.cost(x) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = coeffs.central_diff(&cost_func);
                if closure_err.borrow().is_some() {
                    return run_fd_diff(coeffs, &cost_func, &closure_err);
                }
                match validate_grad(&fd_grad, dim) {
                    Ok(()) => Ok(fd_grad),
                    Err(_) => run_fd_diff(coeffs, &cost_func, &closure_err),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Forward-difference gradient of `func` at `coeffs`, with error capture.
///
/// # Errors
/// Returns any error captured during evaluation of `func` or by validation
/// of the resulting gradient.
fn run_fd_diff<G: Fn(&Coeffs) -> f64>(
    coeffs: &Coeffs, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = coeffs.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, coeffs.len())?;
    Ok(fd_grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::prox::{ProxL1, ProxL2Sq, ProxPositive, ProxZero};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // Quadratic `Σ (x_k − k)²` without an analytic gradient.
    struct NoGradQuadratic;

    impl Model for NoGradQuadratic {
        fn n_coeffs(&self) -> usize {
            3
        }

        fn loss(&self, coeffs: &Coeffs) -> OptResult<Cost> {
            Ok(coeffs.iter().enumerate().map(|(k, x)| (x - k as f64).powi(2)).sum())
        }
    }

    struct Failing;

    impl Model for Failing {
        fn n_coeffs(&self) -> usize {
            1
        }

        fn loss(&self, _coeffs: &Coeffs) -> OptResult<Cost> {
            Err(OptError::ModelNotFitted)
        }
    }

    #[test]
    fn zero_penalty_correction_is_the_zero_vector() {
        let correction = ProxGradient::for_kind("BFGS", ProxZero.kind()).expect("supported");

        assert_eq!(correction.apply(&array![1.5, -2.0, 7.0]), array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn l2sq_correction_is_strength_times_coeffs() {
        let prox = ProxL2Sq::new(0.3).expect("valid strength");
        let correction = ProxGradient::for_kind("BFGS", prox.kind()).expect("supported");

        let g = correction.apply(&array![1.0, -2.0]);
        assert_abs_diff_eq!(g[0], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(g[1], -0.6, epsilon = 1e-12);
    }

    #[test]
    fn non_smooth_penalties_are_rejected() {
        let l1 = ProxL1::new(1.0).expect("valid strength");
        let l2_pos = ProxL2Sq::new(1.0).expect("valid strength").with_positive(true);

        for kind in [l1.kind(), ProxPositive.kind(), l2_pos.kind()] {
            assert!(matches!(
                ProxGradient::for_kind("BFGS", kind),
                Err(OptError::UnsupportedProx { solver: "BFGS", .. })
            ));
        }
    }

    #[test]
    // Purpose
    // -------
    // Without an analytic model gradient, the adapter differentiates the
    // full objective, penalty included.
    fn finite_difference_fallback_includes_penalty() {
        let prox = ProxL2Sq::new(2.0).expect("valid strength");
        let adapter =
            ObjectiveAdapter::new(&NoGradQuadratic, &prox, ProxGradient::L2Sq { strength: 2.0 });
        let x = array![1.0, 0.0, 0.5];

        let g = adapter.gradient(&x).expect("fd gradient should succeed");

        // d/dx_k [(x_k − k)² + x_k²] = 2(x_k − k) + 2 x_k
        let expected = [4.0, -2.0, -2.0];
        for (got, want) in g.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-5);
        }
    }

    #[test]
    fn model_errors_surface_through_cost() {
        let adapter = ObjectiveAdapter::new(&Failing, &ProxZero, ProxGradient::Zero);

        let err = adapter.cost(&array![0.0]).expect_err("loss fails");

        assert_eq!(OptError::from(err), OptError::ModelNotFitted);
    }
}
