//! Validation helpers for the first-order solvers.
//!
//! - **Tolerance checks**: [`verify_tol_grad`], [`verify_tol_cost`] ensure
//!   argmin tolerances are finite and strictly positive when provided;
//!   [`verify_tol_obj`] accepts zero (meaning "never stop early").
//! - **Option checks**: [`verify_frequency`], [`verify_step`].
//! - **Vector checks**: [`validate_coeffs`], [`validate_grad`] enforce
//!   dimension and finiteness.
//! - **Outcome checks**: [`validate_solution`], [`validate_value`].
use crate::optimization::{
    errors::{OptError, OptResult},
    solver::types::{Coeffs, Grad},
};

/// Validate the optional gradient-norm tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional cost-change tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolCost`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the relative-objective tolerance used by epoch-based solvers.
///
/// Zero is allowed and disables the early stop.
///
/// # Errors
/// Returns [`OptError::InvalidTolObj`] if the value is non-finite or < 0.0.
pub fn verify_tol_obj(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidTolObj { tol, reason: "Tolerance must be finite." });
    }
    if tol < 0.0 {
        return Err(OptError::InvalidTolObj { tol, reason: "Tolerance must be non-negative." });
    }
    Ok(())
}

/// Validate a period-like option (`print_every`, `record_every`, `epoch_size`).
///
/// # Errors
/// Returns [`OptError::InvalidFrequency`] when `value == 0`.
pub fn verify_frequency(name: &'static str, value: usize) -> OptResult<()> {
    if value == 0 {
        return Err(OptError::InvalidFrequency { name, value });
    }
    Ok(())
}

/// Validate a step size.
///
/// # Errors
/// Returns [`OptError::InvalidStep`] if the step is non-finite or ≤ 0.0.
pub fn verify_step(step: f64) -> OptResult<()> {
    if !step.is_finite() {
        return Err(OptError::InvalidStep { step, reason: "Step must be finite." });
    }
    if step <= 0.0 {
        return Err(OptError::InvalidStep { step, reason: "Step must be positive." });
    }
    Ok(())
}

/// Validate a starting point against the model dimension.
///
/// # Errors
/// - [`OptError::CoeffsDimMismatch`] if `coeffs.len() != dim`.
/// - [`OptError::InvalidCoeffs`] for the first non-finite entry.
pub fn validate_coeffs(coeffs: &Coeffs, dim: usize) -> OptResult<()> {
    if coeffs.len() != dim {
        return Err(OptError::CoeffsDimMismatch { expected: dim, found: coeffs.len() });
    }
    for (index, &value) in coeffs.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidCoeffs {
                index,
                value,
                reason: "Starting point must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap the solver's best point.
///
/// # Errors
/// - [`OptError::MissingSolution`] if no vector was provided.
/// - [`OptError::InvalidSolution`] if any element is non-finite.
pub fn validate_solution(solution: Option<Coeffs>) -> OptResult<Coeffs> {
    match solution {
        Some(x) => {
            for (index, &value) in x.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidSolution {
                        index,
                        value,
                        reason: "Solution must be finite.",
                    });
                }
            }
            Ok(x)
        }
        None => Err(OptError::MissingSolution),
    }
}

/// Validate that a scalar objective value is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn tolerances_reject_non_positive_and_non_finite() {
        assert!(verify_tol_grad(None).is_ok());
        assert!(verify_tol_grad(Some(1e-8)).is_ok());
        assert!(matches!(verify_tol_grad(Some(0.0)), Err(OptError::InvalidTolGrad { .. })));
        assert!(matches!(verify_tol_cost(Some(f64::NAN)), Err(OptError::InvalidTolCost { .. })));
    }

    #[test]
    fn objective_tolerance_accepts_zero() {
        assert!(verify_tol_obj(0.0).is_ok());
        assert!(matches!(verify_tol_obj(-1e-3), Err(OptError::InvalidTolObj { .. })));
    }

    #[test]
    fn coefficients_are_checked_for_length_then_finiteness() {
        let x = array![1.0, f64::NAN];

        assert_eq!(
            validate_coeffs(&x, 3),
            Err(OptError::CoeffsDimMismatch { expected: 3, found: 2 })
        );
        assert!(matches!(validate_coeffs(&x, 2), Err(OptError::InvalidCoeffs { index: 1, .. })));
    }

    #[test]
    fn missing_solution_is_an_error() {
        assert_eq!(validate_solution(None), Err(OptError::MissingSolution));
        assert_eq!(validate_solution(Some(array![0.5])), Ok(array![0.5]));
    }
}
