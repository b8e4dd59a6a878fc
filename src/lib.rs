//! hawkes_optim — Hawkes process estimation and simulation with first-order
//! solvers.
//!
//! Purpose
//! -------
//! Serve as the crate root: fit Hawkes processes with sum-of-exponentials
//! kernels and a periodic baseline by least squares, using a BFGS solver that
//! wraps argmin and accepts pluggable models and penalties.
//!
//! Key behaviors
//! -------------
//! - [`optimization`]: model/prox traits, the BFGS and SGD solvers, their
//!   configuration, iteration history, and the `OptError` surface.
//! - [`hawkes`]: validated realizations, the least-squares model (whose
//!   weight computation runs on a sized rayon pool), and a thinning
//!   simulator.
//! - [`logging`]: `tracing-subscriber` setup for binaries.
//!
//! Invariants & assumptions
//! ------------------------
//! - Library code never prints; progress goes through `tracing` events.
//! - Failures are returned as `OptError` / `HawkesError`, never panics on
//!   user input.
//!
//! Conventions
//! -----------
//! - Vectors and matrices are `ndarray` containers over `f64`.
//! - Solvers minimize `loss(x) + prox(x)`.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code in each module.
//! - `tests/` holds end-to-end pipelines: regularized regression through both
//!   solvers, and simulate-then-fit for Hawkes processes.

pub mod hawkes;
pub mod logging;
pub mod optimization;
