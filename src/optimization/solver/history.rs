//! Iteration history shared by the solvers.
//!
//! BFGS runs inside argmin's executor, so its per-iteration callback is an
//! argmin observer ([`HistoryObserver`]) that owns the previous iterate and
//! objective and writes into a [`History`] shared through `Arc<Mutex<_>>`.
//! SGD drives its own loop and calls [`HistoryPolicy::handle`] directly.
use std::sync::{Arc, Mutex};

use crate::optimization::{
    errors::OptError,
    solver::{
        traits::HistoryPolicy,
        types::{BfgsState, Coeffs},
    },
    vector_ops::{relative_distance, relative_objective_change},
};
use argmin::core::{observers::Observe, Error, State, KV};
use tracing::info;

/// One recorded iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub n_iter: usize,
    pub obj: f64,
    pub x: Coeffs,
    pub rel_delta: f64,
    pub rel_obj: f64,
}

/// Ordered list of recorded iterations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    records: Vec<HistoryRecord>,
}

impl History {
    pub fn push(&mut self, record: HistoryRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&HistoryRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Objective values in recording order.
    pub fn objectives(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.obj).collect()
    }
}

impl HistoryPolicy {
    /// Record and/or print `record` according to the policy.
    ///
    /// `force` bypasses both periods (used for the final iterate).
    pub fn handle(&self, solver: &'static str, history: &mut History, record: HistoryRecord, force: bool) {
        let n_iter = record.n_iter;
        if self.verbose && (force || n_iter % self.print_every == 0) {
            info!(
                solver,
                n_iter,
                obj = record.obj,
                rel_delta = record.rel_delta,
                rel_obj = record.rel_obj,
                "history"
            );
        }
        if force || n_iter % self.record_every == 0 {
            history.push(record);
        }
    }
}

/// Per-iteration callback attached to the BFGS executor.
pub struct HistoryObserver {
    history: Arc<Mutex<History>>,
    policy: HistoryPolicy,
    n_iter: usize,
    prev_x: Coeffs,
    prev_obj: f64,
}

impl HistoryObserver {
    /// `x0`/`obj0` seed the relative-change computations of the first
    /// iteration.
    pub fn new(history: Arc<Mutex<History>>, policy: HistoryPolicy, x0: Coeffs, obj0: f64) -> Self {
        Self { history, policy, n_iter: 0, prev_x: x0, prev_obj: obj0 }
    }
}

impl Observe<BfgsState> for HistoryObserver {
    fn observe_iter(&mut self, state: &BfgsState, _kv: &KV) -> Result<(), Error> {
        let Some(x) = state.get_param() else {
            return Ok(());
        };
        let obj = state.get_cost();
        let rel_delta = relative_distance(x.view(), self.prev_x.view());
        let rel_obj = relative_objective_change(obj, self.prev_obj);
        self.prev_x.assign(x);
        self.prev_obj = obj;

        let record = HistoryRecord { n_iter: self.n_iter, obj, x: x.clone(), rel_delta, rel_obj };
        let mut history = self.history.lock().map_err(|_| OptError::HistoryUnavailable)?;
        self.policy.handle("BFGS", &mut history, record, false);
        self.n_iter += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn record(n_iter: usize, obj: f64) -> HistoryRecord {
        HistoryRecord { n_iter, obj, x: array![obj], rel_delta: 0.0, rel_obj: 0.0 }
    }

    #[test]
    fn policy_records_every_nth_iteration() {
        let policy = HistoryPolicy::new(false, 10, 3).expect("valid policy");
        let mut history = History::default();

        for n in 0..7 {
            policy.handle("test", &mut history, record(n, n as f64), false);
        }

        let kept: Vec<usize> = history.records().iter().map(|r| r.n_iter).collect();
        assert_eq!(kept, vec![0, 3, 6]);
    }

    #[test]
    fn forced_records_bypass_the_period() {
        let policy = HistoryPolicy::new(false, 10, 5).expect("valid policy");
        let mut history = History::default();

        policy.handle("test", &mut history, record(7, 1.0), true);

        assert_eq!(history.len(), 1);
        assert_eq!(history.objectives(), vec![1.0]);
    }
}
