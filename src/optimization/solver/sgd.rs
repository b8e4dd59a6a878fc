//! Stochastic gradient descent with a proximal step.
//!
//! Each inner step draws a sample `i`, moves against its gradient with the
//! decaying step `step / (t + 1)` and applies the prox. One epoch is
//! `epoch_size` inner steps; the history is handled once per epoch.
//!
//! In [`SgdMode::Batched`] the epoch's per-sample updates of a
//! [`GeneralizedLinearModel`] are all computed at the epoch's starting
//! iterate and applied together through
//! [`batch_multi_incr`](crate::optimization::vector_ops::batch_multi_incr),
//! followed by one prox call per step.
use chrono::{DateTime, Local};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::time::Instant;
use tracing::debug;

use crate::optimization::{
    errors::{OptError, OptResult},
    prox::Prox,
    solver::{
        history::{History, HistoryRecord},
        traits::{HistoryPolicy, StochasticModel},
        types::{Coeffs, Grad},
        validation::{validate_coeffs, verify_frequency, verify_step, verify_tol_obj},
    },
    vector_ops::{batch_multi_incr, mult_incr, relative_distance, relative_objective_change},
};

/// How sample indices are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandType {
    /// Uniformly, with replacement.
    Unif,
    /// Without replacement, reshuffling after each full pass.
    Perm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SgdMode {
    Sequential,
    Batched,
}

/// SGD configuration.
///
/// Defaults: one pass over the data per epoch, `tol = 0` (no early stop),
/// uniform sampling, sequential updates, seed drawn from the OS.
#[derive(Debug, Clone, PartialEq)]
pub struct SgdOptions {
    pub step: f64,
    pub max_iter: usize,
    pub epoch_size: Option<usize>,
    pub tol: f64,
    pub rand_type: RandType,
    pub mode: SgdMode,
    pub seed: Option<u64>,
    pub history: HistoryPolicy,
}

impl SgdOptions {
    /// # Errors
    /// - [`OptError::InvalidStep`] for a non-positive or non-finite step.
    /// - [`OptError::InvalidMaxIter`] when `max_iter == 0`.
    pub fn new(step: f64, max_iter: usize) -> OptResult<Self> {
        verify_step(step)?;
        if max_iter == 0 {
            return Err(OptError::InvalidMaxIter {
                max_iter,
                reason: "Maximum epochs must be greater than zero.",
            });
        }
        Ok(Self {
            step,
            max_iter,
            epoch_size: None,
            tol: 0.0,
            rand_type: RandType::Unif,
            mode: SgdMode::Sequential,
            seed: None,
            history: HistoryPolicy::default(),
        })
    }

    pub fn with_epoch_size(mut self, epoch_size: usize) -> OptResult<Self> {
        verify_frequency("epoch_size", epoch_size)?;
        self.epoch_size = Some(epoch_size);
        Ok(self)
    }

    pub fn with_tol(mut self, tol: f64) -> OptResult<Self> {
        verify_tol_obj(tol)?;
        self.tol = tol;
        Ok(self)
    }

    pub fn with_rand_type(mut self, rand_type: RandType) -> Self {
        self.rand_type = rand_type;
        self
    }

    pub fn with_mode(mut self, mode: SgdMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_history(mut self, history: HistoryPolicy) -> Self {
        self.history = history;
        self
    }
}

/// Draws sample indices according to a [`RandType`].
struct Sampler {
    rng: StdRng,
    rand_type: RandType,
    perm: Vec<usize>,
    cursor: usize,
}

impl Sampler {
    fn new(n_samples: usize, rand_type: RandType, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, rand_type, perm: (0..n_samples).collect(), cursor: n_samples }
    }

    fn next_i(&mut self) -> usize {
        match self.rand_type {
            RandType::Unif => self.rng.gen_range(0..self.perm.len()),
            RandType::Perm => {
                if self.cursor == self.perm.len() {
                    self.perm.shuffle(&mut self.rng);
                    self.cursor = 0;
                }
                let i = self.perm[self.cursor];
                self.cursor += 1;
                i
            }
        }
    }
}

/// Proximal stochastic gradient descent.
pub struct Sgd<'a> {
    options: SgdOptions,
    model: Option<&'a dyn StochasticModel>,
    prox: Option<&'a dyn Prox>,
    history: History,
    solution: Option<Coeffs>,
    /// Global inner-step counter; persists across `solve` calls.
    t: usize,
    time_start: Option<DateTime<Local>>,
    time_end: Option<DateTime<Local>>,
    time_elapsed: Option<f64>,
}

impl<'a> Sgd<'a> {
    pub fn new(options: SgdOptions) -> Self {
        Self {
            options,
            model: None,
            prox: None,
            history: History::default(),
            solution: None,
            t: 0,
            time_start: None,
            time_end: None,
            time_elapsed: None,
        }
    }

    pub fn set_model(&mut self, model: &'a dyn StochasticModel) -> &mut Self {
        self.model = Some(model);
        self
    }

    /// SGD accepts every penalty.
    pub fn set_prox(&mut self, prox: &'a dyn Prox) -> &mut Self {
        self.prox = Some(prox);
        self
    }

    /// `loss(x) + prox(x)` for the attached model and penalty.
    ///
    /// # Errors
    /// [`OptError::ModelNotSet`] / [`OptError::ProxNotSet`], or model errors.
    pub fn objective(&self, coeffs: &Coeffs) -> OptResult<f64> {
        let model = self.model.ok_or(OptError::ModelNotSet)?;
        let prox = self.prox.ok_or(OptError::ProxNotSet)?;
        Ok(model.loss(coeffs)? + prox.value(coeffs))
    }

    /// Run `max_iter` epochs from `x0` (zeros when `None`).
    ///
    /// Stops early when `tol > 0` and the relative objective change of an
    /// epoch drops below `tol`.
    ///
    /// # Errors
    /// - Missing model/prox.
    /// - [`OptError::CoeffsDimMismatch`] / [`OptError::InvalidCoeffs`] for a bad `x0`.
    /// - [`OptError::BatchedModeUnsupported`] in batched mode with a non-GLM model.
    /// - Propagates model errors.
    pub fn solve(&mut self, x0: Option<Coeffs>) -> OptResult<Coeffs> {
        self.history = History::default();
        self.solution = None;
        self.time_start = None;
        self.time_end = None;
        self.time_elapsed = None;
        let model = self.model.ok_or(OptError::ModelNotSet)?;
        let prox = self.prox.ok_or(OptError::ProxNotSet)?;
        let n_coeffs = model.n_coeffs();
        let mut iterate = match x0 {
            Some(x) => {
                validate_coeffs(&x, n_coeffs)?;
                x
            }
            None => Coeffs::zeros(n_coeffs),
        };
        let n_samples = model.n_samples();
        if n_samples == 0 {
            return Err(OptError::EmptyData);
        }
        let epoch_size = self.options.epoch_size.unwrap_or(n_samples);
        let mut sampler = Sampler::new(n_samples, self.options.rand_type, self.options.seed);

        self.time_start = Some(Local::now());
        let clock = Instant::now();

        let mut prev_x = iterate.clone();
        let mut prev_obj = self.objective(&iterate)?;
        let policy = self.options.history;
        for epoch in 1..=self.options.max_iter {
            match self.options.mode {
                SgdMode::Sequential => {
                    self.sequential_epoch(model, prox, &mut sampler, &mut iterate, epoch_size)?
                }
                SgdMode::Batched => {
                    self.batched_epoch(model, prox, &mut sampler, &mut iterate, epoch_size)?
                }
            }
            let obj = self.objective(&iterate)?;
            let rel_delta = relative_distance(iterate.view(), prev_x.view());
            let rel_obj = relative_objective_change(obj, prev_obj);
            let converged = self.options.tol > 0.0 && rel_obj < self.options.tol;
            let last = converged || epoch == self.options.max_iter;
            let record =
                HistoryRecord { n_iter: epoch, obj, x: iterate.clone(), rel_delta, rel_obj };
            policy.handle("SGD", &mut self.history, record, last);
            prev_x.assign(&iterate);
            prev_obj = obj;
            if converged {
                debug!(epoch, rel_obj, "SGD reached tolerance");
                break;
            }
        }

        self.time_end = Some(Local::now());
        self.time_elapsed = Some(clock.elapsed().as_secs_f64());
        self.solution = Some(iterate.clone());
        Ok(iterate)
    }

    fn step_t(&self) -> f64 {
        self.options.step / (self.t as f64 + 1.0)
    }

    fn sequential_epoch(
        &mut self, model: &dyn StochasticModel, prox: &dyn Prox, sampler: &mut Sampler,
        iterate: &mut Coeffs, epoch_size: usize,
    ) -> OptResult<()> {
        let mut grad = Grad::zeros(iterate.len());
        for _ in 0..epoch_size {
            let i = sampler.next_i();
            model.grad_i(i, iterate, &mut grad)?;
            let step_t = self.step_t();
            mult_incr(iterate, -step_t, grad.view());
            *iterate = prox.call(iterate, step_t);
            self.t += 1;
        }
        Ok(())
    }

    fn batched_epoch(
        &mut self, model: &dyn StochasticModel, prox: &dyn Prox, sampler: &mut Sampler,
        iterate: &mut Coeffs, epoch_size: usize,
    ) -> OptResult<()> {
        let glm = model.as_glm().ok_or(OptError::BatchedModeUnsupported)?;
        let mut steps = Vec::with_capacity(epoch_size);
        let mut deltas = Vec::with_capacity(epoch_size);
        let mut rows = Vec::with_capacity(epoch_size);
        for _ in 0..epoch_size {
            let i = sampler.next_i();
            let step_t = self.step_t();
            deltas.push(-step_t * glm.grad_i_factor(i, iterate)?);
            steps.push(step_t);
            rows.push(glm.features(i));
            self.t += 1;
        }
        batch_multi_incr(iterate, &deltas, &rows);
        for step_t in steps {
            *iterate = prox.call(iterate, step_t);
        }
        Ok(())
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn solution(&self) -> Option<&Coeffs> {
        self.solution.as_ref()
    }

    pub fn options(&self) -> &SgdOptions {
        &self.options
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_validate_step_and_epochs() {
        assert!(matches!(SgdOptions::new(0.0, 10), Err(OptError::InvalidStep { .. })));
        assert!(matches!(SgdOptions::new(0.1, 0), Err(OptError::InvalidMaxIter { .. })));
        assert!(matches!(
            SgdOptions::new(0.1, 10).and_then(|o| o.with_epoch_size(0)),
            Err(OptError::InvalidFrequency { name: "epoch_size", value: 0 })
        ));
    }

    #[test]
    fn permutation_sampler_visits_every_index_once_per_pass() {
        let mut sampler = Sampler::new(5, RandType::Perm, Some(7));

        let mut seen: Vec<usize> = (0..5).map(|_| sampler.next_i()).collect();
        seen.sort_unstable();

        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn uniform_sampler_is_reproducible_for_a_seed() {
        let mut a = Sampler::new(100, RandType::Unif, Some(42));
        let mut b = Sampler::new(100, RandType::Unif, Some(42));

        let draws_a: Vec<usize> = (0..20).map(|_| a.next_i()).collect();
        let draws_b: Vec<usize> = (0..20).map(|_| b.next_i()).collect();

        assert_eq!(draws_a, draws_b);
        assert!(draws_a.iter().all(|&i| i < 100));
    }
}
