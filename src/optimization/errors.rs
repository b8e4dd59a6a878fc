use argmin::core::{ArgminError, Error};

use crate::hawkes::errors::HawkesError;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Implies that FD should be used
    GradientNotImplemented,

    /// Gradient dimensions do not match coefficient dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- Solver options ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },
    /// Relative objective tolerance needs to be non-negative and finite.
    InvalidTolObj {
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch {
        name: String,
        reason: &'static str,
    },

    /// `print_every` / `record_every` / `epoch_size` must be at least 1.
    InvalidFrequency {
        name: &'static str,
        value: usize,
    },

    /// Step size needs to be positive and finite.
    InvalidStep {
        step: f64,
        reason: &'static str,
    },

    // ---- Solver configuration ----
    /// The solver cannot handle this proximal operator.
    UnsupportedProx {
        solver: &'static str,
        prox: String,
    },
    /// Penalty strength needs to be non-negative and finite.
    InvalidProxStrength {
        strength: f64,
    },
    /// `solve` called before `set_model`.
    ModelNotSet,
    /// `solve` called before `set_prox`.
    ProxNotSet,
    /// Batched SGD needs a generalized linear model.
    BatchedModeUnsupported,

    // ---- Coefficients ----
    /// Starting point length does not match the model.
    CoeffsDimMismatch {
        expected: usize,
        found: usize,
    },
    /// Coefficients must be finite.
    InvalidCoeffs {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    // ---- Solver outcome ----
    /// Solution coordinates must be finite.
    InvalidSolution {
        index: usize,
        value: f64,
        reason: &'static str,
    },
    /// Solver produced no solution.
    MissingSolution,
    /// History buffer could not be recovered from the observer.
    HistoryUnavailable,

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Model data ----
    /// Feature rows and labels disagree in length.
    FeaturesLabelsMismatch {
        n_rows: usize,
        n_labels: usize,
    },
    /// Model input data must be finite.
    NonFiniteData {
        index: usize,
        value: f64,
    },
    /// Model has no samples.
    EmptyData,

    // ---- Hawkes ----
    /// Hawkes model used before `fit`.
    ModelNotFitted,
    /// Any other Hawkes model failure, already formatted.
    HawkesModel {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Gradient not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- Solver options ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidTolObj { tol, reason } => {
                write!(f, "Invalid relative objective tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidFrequency { name, value } => {
                write!(f, "Invalid {name} {value}: must be at least 1")
            }
            OptError::InvalidStep { step, reason } => {
                write!(f, "Invalid step size {step}: {reason}")
            }

            // ---- Solver configuration ----
            OptError::UnsupportedProx { solver, prox } => {
                write!(f, "{solver} only accepts ProxZero and ProxL2Sq for now; got {prox}")
            }
            OptError::InvalidProxStrength { strength } => {
                write!(f, "Invalid penalty strength {strength}: must be finite and >= 0")
            }
            OptError::ModelNotSet => {
                write!(f, "No model set; call set_model before solve")
            }
            OptError::ProxNotSet => {
                write!(f, "No proximal operator set; call set_prox before solve")
            }
            OptError::BatchedModeUnsupported => {
                write!(f, "Batched SGD requires a generalized linear model")
            }

            // ---- Coefficients ----
            OptError::CoeffsDimMismatch { expected, found } => {
                write!(f, "Coefficient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidCoeffs { index, value, reason } => {
                write!(f, "Invalid coefficient at index {index}: {value}: {reason}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }

            // ---- Solver outcome ----
            OptError::InvalidSolution { index, value, reason } => {
                write!(f, "Invalid solution at index {index}: {value}: {reason}")
            }
            OptError::MissingSolution => {
                write!(f, "Solver returned no solution")
            }
            OptError::HistoryUnavailable => {
                write!(f, "Iteration history could not be recovered")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Model data ----
            OptError::FeaturesLabelsMismatch { n_rows, n_labels } => {
                write!(f, "Features have {n_rows} rows but {n_labels} labels were given")
            }
            OptError::NonFiniteData { index, value } => {
                write!(f, "Model data at flat index {index} is non-finite: {value}")
            }
            OptError::EmptyData => {
                write!(f, "Model data is empty")
            }

            // ---- Hawkes ----
            OptError::ModelNotFitted => {
                write!(f, "Model hasn't been fitted yet")
            }
            OptError::HawkesModel { text } => {
                write!(f, "Hawkes model error: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Errors raised by our own cost/gradient travel through argmin untouched.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

impl From<HawkesError> for OptError {
    fn from(err: HawkesError) -> Self {
        match err {
            HawkesError::ModelNotFitted => OptError::ModelNotFitted,
            other => OptError::HawkesModel { text: other.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // A crate error that was boxed into an argmin `Error` (as happens when
    // a cost function fails inside the executor) must come back unchanged.
    fn from_argmin_error_recovers_crate_errors() {
        let boxed: Error = OptError::NonFiniteCost { value: f64::INFINITY }.into();

        let recovered = OptError::from(boxed);

        assert_eq!(recovered, OptError::NonFiniteCost { value: f64::INFINITY });
    }

    #[test]
    // Purpose
    // -------
    // Argmin's own error kinds map onto the matching wrapper variants.
    fn from_argmin_error_maps_backend_kinds() {
        let boxed: Error = ArgminError::NotInitialized { text: "inverse Hessian".to_string() }.into();

        let mapped = OptError::from(boxed);

        assert_eq!(mapped, OptError::NotInitialized { text: "inverse Hessian".to_string() });
    }

    #[test]
    fn hawkes_not_fitted_keeps_its_identity() {
        assert_eq!(OptError::from(HawkesError::ModelNotFitted), OptError::ModelNotFitted);
        assert!(matches!(
            OptError::from(HawkesError::NoEvents),
            OptError::HawkesModel { .. }
        ));
    }
}
