//! solver — first-order solvers over a `(Model, Prox)` pair.
//!
//! Purpose
//! -------
//! Minimize `f(x) = loss(x) + prox(x)` for a user model and a penalty,
//! either with argmin's BFGS ([`Bfgs`]) or with proximal stochastic gradient
//! descent ([`Sgd`]), and keep a per-iteration [`History`].
//!
//! Key behaviors
//! -------------
//! - BFGS accepts only smooth penalties (`ProxZero`, `ProxL2Sq`) and rejects
//!   the others when the prox is attached, before any iteration runs.
//! - Missing analytic gradients fall back to finite differences of the full
//!   objective (`adapter`).
//! - SGD accepts every penalty and applies it as a proximal step.
//!
//! Conventions
//! -----------
//! - Always minimize; no sign flips.
//! - Configuration is validated at construction (`Tolerances::new`,
//!   `HistoryPolicy::new`, `SgdOptions::new`) and failures surface as
//!   `OptError`.
pub mod adapter;
pub mod bfgs;
pub mod builders;
pub mod history;
pub mod run;
pub mod sgd;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::bfgs::Bfgs;
pub use self::history::{History, HistoryRecord};
pub use self::sgd::{RandType, Sgd, SgdMode, SgdOptions};
pub use self::traits::{
    BfgsOptions, GeneralizedLinearModel, HistoryPolicy, LineSearcher, Model, SolveOutcome,
    StochasticModel, Tolerances,
};
pub use self::types::{Coeffs, Cost, FnEvalMap, Grad};

pub mod prelude {
    pub use super::bfgs::Bfgs;
    pub use super::history::History;
    pub use super::sgd::{Sgd, SgdOptions};
    pub use super::traits::{BfgsOptions, HistoryPolicy, LineSearcher, Model, Tolerances};
    pub use super::types::{Coeffs, Grad};
}
