//! Small vector kernels shared by the solvers.
//!
//! `mult_incr` is the `y += α·x` update at the heart of every gradient step;
//! `batch_multi_incr` applies many such updates at once, splitting the batch
//! across the rayon pool and summing partial results. `batch_dot` is its
//! read-only counterpart.
use ndarray::{Array1, ArrayView1, Zip};
use rayon::prelude::*;

/// Batches smaller than this are applied sequentially.
const PAR_BATCH_MIN: usize = 64;

/// Relative distance `||new − old|| / ||old||`, with the denominator
/// replaced by 1 when `old` is the zero vector.
pub fn relative_distance(new: ArrayView1<'_, f64>, old: ArrayView1<'_, f64>) -> f64 {
    let mut norm_old = old.dot(&old).sqrt();
    if norm_old == 0.0 {
        norm_old = 1.0;
    }
    let diff: f64 = Zip::from(&new).and(&old).fold(0.0, |acc, &a, &b| acc + (a - b) * (a - b));
    diff.sqrt() / norm_old
}

/// Relative change of a scalar objective, `|new − old| / |old|`.
///
/// Falls back to the absolute change when `old == 0`.
pub fn relative_objective_change(new: f64, old: f64) -> f64 {
    let delta = (new - old).abs();
    if old == 0.0 { delta } else { delta / old.abs() }
}

/// `y += alpha · x`.
pub fn mult_incr(y: &mut Array1<f64>, alpha: f64, x: ArrayView1<'_, f64>) {
    y.scaled_add(alpha, &x);
}

/// `[y · xs[0], y · xs[1], …]`, computed in parallel for large batches.
pub fn batch_dot(y: ArrayView1<'_, f64>, xs: &[ArrayView1<'_, f64>]) -> Vec<f64> {
    if xs.len() < PAR_BATCH_MIN {
        return xs.iter().map(|x| x.dot(&y)).collect();
    }
    xs.par_iter().map(|x| x.dot(&y)).collect()
}

/// `y += Σ_k alphas[k] · xs[k]`.
///
/// Large batches are reduced in parallel; `xs` must all have `y.len()`
/// entries and `alphas.len() == xs.len()`.
pub fn batch_multi_incr(y: &mut Array1<f64>, alphas: &[f64], xs: &[ArrayView1<'_, f64>]) {
    debug_assert_eq!(alphas.len(), xs.len());
    if xs.len() < PAR_BATCH_MIN {
        for (&alpha, x) in alphas.iter().zip(xs) {
            mult_incr(y, alpha, x.view());
        }
        return;
    }
    let n = y.len();
    let total = alphas
        .par_iter()
        .zip(xs.par_iter())
        .fold(
            || Array1::<f64>::zeros(n),
            |mut acc, (&alpha, x)| {
                mult_incr(&mut acc, alpha, x.view());
                acc
            },
        )
        .reduce(|| Array1::<f64>::zeros(n), |a, b| a + b);
    *y += &total;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn relative_distance_uses_old_norm() {
        let old = array![3.0, 4.0];
        let new = array![3.0, 9.0];

        assert_abs_diff_eq!(relative_distance(new.view(), old.view()), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn relative_distance_from_zero_is_absolute() {
        let old = array![0.0, 0.0];
        let new = array![3.0, 4.0];

        assert_abs_diff_eq!(relative_distance(new.view(), old.view()), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn relative_objective_change_handles_zero_reference() {
        assert_abs_diff_eq!(relative_objective_change(1.5, 2.0), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(relative_objective_change(0.5, 0.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The parallel path must agree with a plain sequential accumulation.
    fn batch_multi_incr_matches_sequential_updates() {
        let rows: Vec<Array1<f64>> =
            (0..200).map(|k| array![k as f64, 1.0, -0.5 * k as f64]).collect();
        let views: Vec<ArrayView1<'_, f64>> = rows.iter().map(|r| r.view()).collect();
        let alphas: Vec<f64> = (0..200).map(|k| 0.01 * k as f64).collect();

        let mut par = array![1.0, 2.0, 3.0];
        batch_multi_incr(&mut par, &alphas, &views);

        let mut seq = array![1.0, 2.0, 3.0];
        for (alpha, row) in alphas.iter().zip(&rows) {
            mult_incr(&mut seq, *alpha, row.view());
        }

        for (a, b) in par.iter().zip(seq.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn batch_dot_agrees_on_both_paths() {
        let rows: Vec<Array1<f64>> = (0..100).map(|k| array![k as f64, 2.0]).collect();
        let views: Vec<ArrayView1<'_, f64>> = rows.iter().map(|r| r.view()).collect();
        let y = array![0.5, -1.0];

        let all = batch_dot(y.view(), &views);
        let few = batch_dot(y.view(), &views[..3]);

        assert_eq!(all.len(), 100);
        assert_abs_diff_eq!(all[10], 3.0, epsilon = 1e-12);
        assert_eq!(few, vec![-2.0, -1.5, -1.0]);
    }
}
