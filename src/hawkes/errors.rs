//! Errors for Hawkes data, least-squares estimation and simulation.
//!
//! ## Conventions
//! - **Indices are 0-based**; `node` indexes the process dimension, `index`
//!   the position inside that node's timestamp array.
//! - Timestamps must be finite, non-negative, non-decreasing and not past the
//!   realization's `end_time`.
//! - Decays, period lengths and end times must be finite and strictly
//!   positive; baselines and adjacency entries finite and non-negative.
use statrs::distribution::ExpError;

/// Result alias for Hawkes operations that may produce [`HawkesError`].
pub type HawkesResult<T> = Result<T, HawkesError>;

#[derive(Debug, Clone, PartialEq)]
pub enum HawkesError {
    // ---- Data validation ----
    /// `fit` was called with an empty list of realizations.
    NoRealizations,

    /// A realization has zero nodes.
    NoNodes,

    /// Realizations disagree on the number of nodes.
    NodeCountMismatch { realization: usize, expected: usize, found: usize },

    /// `end_time` must be finite and > 0.
    InvalidEndTime { value: f64 },

    /// Timestamp is NaN/±inf or negative.
    InvalidTimestamp { node: usize, index: usize, value: f64 },

    /// Timestamps of a node must be non-decreasing.
    UnsortedTimestamps { node: usize, index: usize },

    /// Timestamp lies past the realization's end time.
    TimestampAfterEnd { node: usize, index: usize, value: f64, end_time: f64 },

    /// No realization contains a single jump.
    NoEvents,

    // ---- Kernel / model configuration ----
    /// At least one decay is required.
    EmptyDecays,

    /// Decays must be finite and > 0.
    InvalidDecay { index: usize, value: f64 },

    /// The baseline needs at least one slot per period.
    InvalidBaselineCount { n_baselines: usize },

    /// `period_length` must be finite and > 0.
    InvalidPeriodLength { value: f64 },

    /// Worker pools need at least one thread.
    InvalidThreadCount { n_threads: usize },

    /// Coefficient vector length differs from `n_coeffs`.
    CoeffsDimMismatch { expected: usize, found: usize },

    /// `loss`/`grad` used before `fit`.
    ModelNotFitted,

    // ---- Simulation ----
    /// Baseline matrix must be `n_nodes × n_baselines`.
    BaselineShape { expected: (usize, usize), found: (usize, usize) },

    /// Baselines must be finite and ≥ 0.
    InvalidBaseline { node: usize, slot: usize, value: f64 },

    /// Adjacency tensor must be `n_nodes × n_nodes × n_decays`.
    AdjacencyShape { expected: (usize, usize, usize), found: (usize, usize, usize) },

    /// Adjacency entries must be finite and ≥ 0.
    InvalidAdjacency { index: (usize, usize, usize), value: f64 },

    /// Target spectral radius must be finite and > 0.
    InvalidSpectralRadius { value: f64 },

    /// Cannot rescale an adjacency whose spectral radius is zero.
    ZeroSpectralRadius,

    /// Multi-simulation needs at least one run.
    InvalidSimulationCount { n_simulations: usize },

    // ---- Backends ----
    /// Wrapper for statrs::distribution::ExpError
    InvalidExpParam,

    /// Rayon failed to build a worker pool.
    ThreadPool { text: String },
}

impl std::error::Error for HawkesError {}

impl std::fmt::Display for HawkesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Data validation ----
            HawkesError::NoRealizations => write!(f, "At least one realization is required."),
            HawkesError::NoNodes => write!(f, "A realization must contain at least one node."),
            HawkesError::NodeCountMismatch { realization, expected, found } => {
                write!(
                    f,
                    "Realization {realization} has {found} nodes; expected {expected} like the first one."
                )
            }
            HawkesError::InvalidEndTime { value } => {
                write!(f, "end_time must be finite and > 0; got: {value}")
            }
            HawkesError::InvalidTimestamp { node, index, value } => {
                write!(
                    f,
                    "Timestamp {index} of node {node} must be finite and >= 0; got: {value}"
                )
            }
            HawkesError::UnsortedTimestamps { node, index } => {
                write!(f, "Timestamps of node {node} decrease at index {index}.")
            }
            HawkesError::TimestampAfterEnd { node, index, value, end_time } => {
                write!(
                    f,
                    "Timestamp {index} of node {node} ({value}) lies after end_time ({end_time})."
                )
            }
            HawkesError::NoEvents => write!(f, "Realizations contain no events."),
            // ---- Kernel / model configuration ----
            HawkesError::EmptyDecays => write!(f, "At least one decay is required."),
            HawkesError::InvalidDecay { index, value } => {
                write!(f, "Decay {index} must be finite and > 0; got: {value}")
            }
            HawkesError::InvalidBaselineCount { n_baselines } => {
                write!(f, "n_baselines must be >= 1; got: {n_baselines}")
            }
            HawkesError::InvalidPeriodLength { value } => {
                write!(f, "period_length must be finite and > 0; got: {value}")
            }
            HawkesError::InvalidThreadCount { n_threads } => {
                write!(f, "n_threads must be >= 1; got: {n_threads}")
            }
            HawkesError::CoeffsDimMismatch { expected, found } => {
                write!(f, "Coefficient vector must have length {expected}; got: {found}")
            }
            HawkesError::ModelNotFitted => write!(f, "Model hasn't been fitted yet."),
            // ---- Simulation ----
            HawkesError::BaselineShape { expected, found } => {
                write!(f, "Baseline must have shape {expected:?}; got: {found:?}")
            }
            HawkesError::InvalidBaseline { node, slot, value } => {
                write!(f, "Baseline of node {node}, slot {slot} must be finite and >= 0; got: {value}")
            }
            HawkesError::AdjacencyShape { expected, found } => {
                write!(f, "Adjacency must have shape {expected:?}; got: {found:?}")
            }
            HawkesError::InvalidAdjacency { index, value } => {
                write!(f, "Adjacency entry {index:?} must be finite and >= 0; got: {value}")
            }
            HawkesError::InvalidSpectralRadius { value } => {
                write!(f, "Target spectral radius must be finite and > 0; got: {value}")
            }
            HawkesError::ZeroSpectralRadius => {
                write!(f, "Cannot rescale an adjacency with zero spectral radius.")
            }
            HawkesError::InvalidSimulationCount { n_simulations } => {
                write!(f, "n_simulations must be >= 1; got: {n_simulations}")
            }
            // ---- Backends ----
            HawkesError::InvalidExpParam => {
                write!(f, "Exponential distribution requires rate > 0.")
            }
            HawkesError::ThreadPool { text } => write!(f, "Failed to build thread pool: {text}"),
        }
    }
}

impl From<ExpError> for HawkesError {
    fn from(_: ExpError) -> HawkesError {
        HawkesError::InvalidExpParam
    }
}

impl From<rayon::ThreadPoolBuildError> for HawkesError {
    fn from(err: rayon::ThreadPoolBuildError) -> HawkesError {
        HawkesError::ThreadPool { text: err.to_string() }
    }
}
