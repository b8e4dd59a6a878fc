//! Validated multivariate point-process realizations.
use ndarray::Array1;

use crate::hawkes::errors::{HawkesError, HawkesResult};

/// One observed realization: a timestamp array per node on `[0, end_time]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HawkesRealization {
    timestamps: Vec<Array1<f64>>,
    end_time: f64,
}

impl HawkesRealization {
    /// # Errors
    /// - [`HawkesError::NoNodes`] for an empty node list.
    /// - [`HawkesError::InvalidEndTime`] for a non-finite or non-positive end time.
    /// - [`HawkesError::InvalidTimestamp`], [`HawkesError::UnsortedTimestamps`],
    ///   [`HawkesError::TimestampAfterEnd`] for the first offending timestamp.
    pub fn new(timestamps: Vec<Array1<f64>>, end_time: f64) -> HawkesResult<Self> {
        if timestamps.is_empty() {
            return Err(HawkesError::NoNodes);
        }
        if !end_time.is_finite() || end_time <= 0.0 {
            return Err(HawkesError::InvalidEndTime { value: end_time });
        }
        for (node, ts) in timestamps.iter().enumerate() {
            let mut prev = 0.0;
            for (index, &value) in ts.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(HawkesError::InvalidTimestamp { node, index, value });
                }
                if value < prev {
                    return Err(HawkesError::UnsortedTimestamps { node, index });
                }
                if value > end_time {
                    return Err(HawkesError::TimestampAfterEnd { node, index, value, end_time });
                }
                prev = value;
            }
        }
        Ok(Self { timestamps, end_time })
    }

    /// Build a realization ending at the last observed jump.
    ///
    /// # Errors
    /// As [`HawkesRealization::new`]; [`HawkesError::NoEvents`] when every
    /// node is empty.
    pub fn ending_at_last_jump(timestamps: Vec<Array1<f64>>) -> HawkesResult<Self> {
        let end_time = timestamps
            .iter()
            .filter_map(|ts| ts.iter().copied().reduce(f64::max))
            .reduce(f64::max)
            .ok_or(HawkesError::NoEvents)?;
        Self::new(timestamps, end_time)
    }

    pub fn n_nodes(&self) -> usize {
        self.timestamps.len()
    }

    pub fn n_jumps(&self) -> usize {
        self.timestamps.iter().map(Array1::len).sum()
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn timestamps(&self) -> &[Array1<f64>] {
        &self.timestamps
    }

    pub fn node(&self, node: usize) -> Option<&Array1<f64>> {
        self.timestamps.get(node)
    }

    /// Merge all nodes into one time-ordered list of `(time, node)` events.
    pub(crate) fn merged_events(&self) -> Vec<(f64, usize)> {
        let mut events: Vec<(f64, usize)> = self
            .timestamps
            .iter()
            .enumerate()
            .flat_map(|(node, ts)| ts.iter().map(move |&t| (t, node)))
            .collect();
        events.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        events
    }
}

/// Check that all realizations share a node count; return it.
///
/// # Errors
/// [`HawkesError::NoRealizations`] or [`HawkesError::NodeCountMismatch`].
pub fn common_node_count(realizations: &[HawkesRealization]) -> HawkesResult<usize> {
    let first = realizations.first().ok_or(HawkesError::NoRealizations)?;
    let expected = first.n_nodes();
    for (realization, r) in realizations.iter().enumerate().skip(1) {
        if r.n_nodes() != expected {
            return Err(HawkesError::NodeCountMismatch {
                realization,
                expected,
                found: r.n_nodes(),
            });
        }
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn rejects_unsorted_and_out_of_window_timestamps() {
        assert_eq!(
            HawkesRealization::new(vec![array![1.0, 0.5]], 2.0),
            Err(HawkesError::UnsortedTimestamps { node: 0, index: 1 })
        );
        assert!(matches!(
            HawkesRealization::new(vec![array![0.5], array![3.0]], 2.0),
            Err(HawkesError::TimestampAfterEnd { node: 1, index: 0, .. })
        ));
        assert!(matches!(
            HawkesRealization::new(vec![array![-0.1]], 2.0),
            Err(HawkesError::InvalidTimestamp { node: 0, index: 0, .. })
        ));
        assert_eq!(HawkesRealization::new(vec![], 1.0), Err(HawkesError::NoNodes));
    }

    #[test]
    fn merged_events_are_time_ordered() {
        let r = HawkesRealization::new(vec![array![0.2, 1.5], array![0.7]], 2.0)
            .expect("valid realization");

        assert_eq!(r.n_jumps(), 3);
        assert_eq!(r.merged_events(), vec![(0.2, 0), (0.7, 1), (1.5, 0)]);
    }

    #[test]
    fn end_time_defaults_to_last_jump() {
        let r = HawkesRealization::ending_at_last_jump(vec![array![0.2, 1.5], array![1.9]])
            .expect("valid realization");
        assert_eq!(r.end_time(), 1.9);

        assert_eq!(
            HawkesRealization::ending_at_last_jump(vec![Array1::zeros(0), Array1::zeros(0)]),
            Err(HawkesError::NoEvents)
        );
    }

    #[test]
    fn node_counts_must_agree() {
        let a = HawkesRealization::new(vec![array![0.1]], 1.0).expect("valid");
        let b = HawkesRealization::new(vec![array![0.1], array![0.2]], 1.0).expect("valid");

        assert_eq!(common_node_count(&[a.clone()]), Ok(1));
        assert_eq!(
            common_node_count(&[a, b]),
            Err(HawkesError::NodeCountMismatch { realization: 1, expected: 1, found: 2 })
        );
        assert_eq!(common_node_count(&[]), Err(HawkesError::NoRealizations));
    }
}
