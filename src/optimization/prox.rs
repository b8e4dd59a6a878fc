//! prox — penalization functions and their proximal operators.
//!
//! A [`Prox`] exposes the penalty value `g(x)`, its proximal step
//! `prox_{step·g}(x)`, and a [`ProxKind`] tag that solvers inspect to decide
//! whether they can handle it. Gradient-based solvers (BFGS) only accept the
//! smooth kinds; SGD applies any prox after each step.
//!
//! Strengths are validated at construction: finite and non-negative.
use crate::optimization::{
    errors::{OptError, OptResult},
    solver::types::Coeffs,
};

/// Tag describing a penalty, used by solvers to validate what they receive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProxKind {
    /// No penalty.
    Zero,
    /// `strength / 2 · ||x||²`, optionally restricted to `x ≥ 0`.
    L2Sq { strength: f64, positive: bool },
    /// `strength · ||x||₁`, optionally restricted to `x ≥ 0`.
    L1 { strength: f64, positive: bool },
    /// Indicator of the non-negative orthant.
    Positive,
}

impl ProxKind {
    /// Short name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ProxKind::Zero => "ProxZero",
            ProxKind::L2Sq { .. } => "ProxL2Sq",
            ProxKind::L1 { .. } => "ProxL1",
            ProxKind::Positive => "ProxPositive",
        }
    }
}

/// Penalty with a closed-form proximal operator.
pub trait Prox {
    /// Penalty value `g(x)`.
    fn value(&self, coeffs: &Coeffs) -> f64;

    /// Proximal step `argmin_z { g(z)·step + ||z − x||² / 2 }`.
    fn call(&self, coeffs: &Coeffs, step: f64) -> Coeffs;

    fn kind(&self) -> ProxKind;
}

/// No penalization at all.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProxZero;

impl Prox for ProxZero {
    fn value(&self, _coeffs: &Coeffs) -> f64 {
        0.0
    }

    fn call(&self, coeffs: &Coeffs, _step: f64) -> Coeffs {
        coeffs.clone()
    }

    fn kind(&self) -> ProxKind {
        ProxKind::Zero
    }
}

/// Ridge penalty `strength / 2 · ||x||²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxL2Sq {
    strength: f64,
    positive: bool,
}

impl ProxL2Sq {
    /// # Errors
    /// [`OptError::InvalidProxStrength`] if `strength` is negative or non-finite.
    pub fn new(strength: f64) -> OptResult<Self> {
        verify_strength(strength)?;
        Ok(Self { strength, positive: false })
    }

    /// Also project onto `x ≥ 0` after shrinking.
    pub fn with_positive(mut self, positive: bool) -> Self {
        self.positive = positive;
        self
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }
}

impl Prox for ProxL2Sq {
    fn value(&self, coeffs: &Coeffs) -> f64 {
        0.5 * self.strength * coeffs.dot(coeffs)
    }

    fn call(&self, coeffs: &Coeffs, step: f64) -> Coeffs {
        let shrink = 1.0 / (1.0 + step * self.strength);
        let positive = self.positive;
        coeffs.mapv(|x| {
            let z = x * shrink;
            if positive { z.max(0.0) } else { z }
        })
    }

    fn kind(&self) -> ProxKind {
        ProxKind::L2Sq { strength: self.strength, positive: self.positive }
    }
}

/// Lasso penalty `strength · ||x||₁`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxL1 {
    strength: f64,
    positive: bool,
}

impl ProxL1 {
    /// # Errors
    /// [`OptError::InvalidProxStrength`] if `strength` is negative or non-finite.
    pub fn new(strength: f64) -> OptResult<Self> {
        verify_strength(strength)?;
        Ok(Self { strength, positive: false })
    }

    pub fn with_positive(mut self, positive: bool) -> Self {
        self.positive = positive;
        self
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }
}

impl Prox for ProxL1 {
    fn value(&self, coeffs: &Coeffs) -> f64 {
        self.strength * coeffs.iter().map(|x| x.abs()).sum::<f64>()
    }

    fn call(&self, coeffs: &Coeffs, step: f64) -> Coeffs {
        let thresh = step * self.strength;
        let positive = self.positive;
        coeffs.mapv(|x| {
            if positive {
                (x - thresh).max(0.0)
            } else {
                x.signum() * (x.abs() - thresh).max(0.0)
            }
        })
    }

    fn kind(&self) -> ProxKind {
        ProxKind::L1 { strength: self.strength, positive: self.positive }
    }
}

/// Projection onto the non-negative orthant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProxPositive;

impl Prox for ProxPositive {
    // Indicator function; the solvers only ever evaluate it at feasible points.
    fn value(&self, _coeffs: &Coeffs) -> f64 {
        0.0
    }

    fn call(&self, coeffs: &Coeffs, _step: f64) -> Coeffs {
        coeffs.mapv(|x| x.max(0.0))
    }

    fn kind(&self) -> ProxKind {
        ProxKind::Positive
    }
}

fn verify_strength(strength: f64) -> OptResult<()> {
    if !strength.is_finite() || strength < 0.0 {
        return Err(OptError::InvalidProxStrength { strength });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn l2sq_value_and_shrinkage() {
        let prox = ProxL2Sq::new(2.0).expect("valid strength");
        let x = array![1.0, -3.0];

        assert_abs_diff_eq!(prox.value(&x), 10.0, epsilon = 1e-12);
        let z = prox.call(&x, 0.5);
        assert_abs_diff_eq!(z[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(z[1], -1.5, epsilon = 1e-12);
    }

    #[test]
    fn l1_soft_thresholds_and_respects_positivity() {
        let x = array![2.0, -0.3, -2.0];

        let z = ProxL1::new(1.0).expect("valid strength").call(&x, 0.5);
        assert_eq!(z, array![1.5, -0.0, -1.5]);

        let z_pos = ProxL1::new(1.0).expect("valid strength").with_positive(true).call(&x, 0.5);
        assert_eq!(z_pos, array![1.5, 0.0, 0.0]);
    }

    #[test]
    fn positive_projection_clamps_negatives() {
        let z = ProxPositive.call(&array![-1.0, 0.25], 1.0);
        assert_eq!(z, array![0.0, 0.25]);
    }

    #[test]
    fn strengths_must_be_finite_and_non_negative() {
        assert_eq!(ProxL2Sq::new(-1.0), Err(OptError::InvalidProxStrength { strength: -1.0 }));
        assert!(ProxL1::new(f64::INFINITY).is_err());
        assert!(ProxL1::new(0.0).is_ok());
    }
}
