//! Least-squares linear regression model.
//!
//! `loss(w) = 1/(2n) · ||y − Xw||²`, with per-sample gradients
//! `(x_i·w − y_i) · x_i`. Used as the reference smooth problem for both
//! solvers, and as the generalized linear model behind batched SGD.
use ndarray::{Array1, Array2, ArrayView1};

use crate::optimization::{
    errors::{OptError, OptResult},
    solver::{
        traits::{GeneralizedLinearModel, Model, StochasticModel},
        types::{Coeffs, Cost, Grad},
        validation::validate_coeffs,
    },
    vector_ops::batch_dot,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ModelLinReg {
    features: Array2<f64>,
    labels: Array1<f64>,
}

impl ModelLinReg {
    /// # Errors
    /// - [`OptError::EmptyData`] when there are no rows or no columns.
    /// - [`OptError::FeaturesLabelsMismatch`] when row and label counts differ.
    /// - [`OptError::NonFiniteData`] for the first non-finite feature or
    ///   label (index into the flattened features, then the labels).
    pub fn new(features: Array2<f64>, labels: Array1<f64>) -> OptResult<Self> {
        let (n_rows, n_cols) = features.dim();
        if n_rows == 0 || n_cols == 0 {
            return Err(OptError::EmptyData);
        }
        if n_rows != labels.len() {
            return Err(OptError::FeaturesLabelsMismatch { n_rows, n_labels: labels.len() });
        }
        for (index, &value) in features.iter().chain(labels.iter()).enumerate() {
            if !value.is_finite() {
                return Err(OptError::NonFiniteData { index, value });
            }
        }
        Ok(Self { features, labels })
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    fn residuals(&self, coeffs: &Coeffs) -> OptResult<Array1<f64>> {
        validate_coeffs(coeffs, self.n_coeffs())?;
        let rows: Vec<ArrayView1<'_, f64>> = self.features.rows().into_iter().collect();
        let predictions = Array1::from(batch_dot(coeffs.view(), &rows));
        Ok(predictions - &self.labels)
    }
}

impl Model for ModelLinReg {
    fn n_coeffs(&self) -> usize {
        self.features.ncols()
    }

    fn loss(&self, coeffs: &Coeffs) -> OptResult<Cost> {
        let r = self.residuals(coeffs)?;
        Ok(r.dot(&r) / (2.0 * self.n_samples() as f64))
    }

    fn grad(&self, coeffs: &Coeffs) -> OptResult<Grad> {
        let r = self.residuals(coeffs)?;
        Ok(self.features.t().dot(&r) / self.n_samples() as f64)
    }
}

impl StochasticModel for ModelLinReg {
    fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    fn grad_i(&self, i: usize, coeffs: &Coeffs, out: &mut Grad) -> OptResult<()> {
        let factor = self.grad_i_factor(i, coeffs)?;
        out.assign(&self.features.row(i));
        *out *= factor;
        Ok(())
    }

    fn as_glm(&self) -> Option<&dyn GeneralizedLinearModel> {
        Some(self)
    }
}

impl GeneralizedLinearModel for ModelLinReg {
    fn features(&self, i: usize) -> ArrayView1<'_, f64> {
        self.features.row(i)
    }

    fn grad_i_factor(&self, i: usize, coeffs: &Coeffs) -> OptResult<f64> {
        if coeffs.len() != self.n_coeffs() {
            return Err(OptError::CoeffsDimMismatch {
                expected: self.n_coeffs(),
                found: coeffs.len(),
            });
        }
        Ok(self.features.row(i).dot(coeffs) - self.labels[i])
    }
}
