use crate::rng::SimpleRng;

/// Shuffle `0..n` with `seed` and cut off `ceil(test_fraction * n)` rows for
/// evaluation. Returns `(train, eval)`.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.min(n);
    let mut perm: Vec<usize> = (0..n).collect();
    SimpleRng::new(seed).shuffle(&mut perm);
    let train = perm.split_off(n_test);
    (train, perm)
}

pub fn mean_absolute_error(truth: &[f64], predicted: &[f64]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / truth.len() as f64
}

/// Coefficient of determination, always finite: degenerate cases (fewer
/// than two rows or a constant target) score 1.0 for a perfect fit and 0.0
/// otherwise.
pub fn r2_score(truth: &[f64], predicted: &[f64]) -> f64 {
    let ss_res: f64 = truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let mean = truth.iter().sum::<f64>() / truth.len().max(1) as f64;
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();

    if truth.len() < 2 || ss_tot <= f64::EPSILON {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_sizes_round_test_up() {
        let (train, eval) = train_test_split(10, 0.2, 42);
        assert_eq!((train.len(), eval.len()), (8, 2));
        let (train, eval) = train_test_split(3, 0.2, 42);
        assert_eq!((train.len(), eval.len()), (2, 1));
    }

    #[test]
    fn split_is_reproducible_and_disjoint() {
        let (a_train, a_eval) = train_test_split(50, 0.2, 42);
        let (b_train, b_eval) = train_test_split(50, 0.2, 42);
        assert_eq!(a_train, b_train);
        assert_eq!(a_eval, b_eval);
        assert!(a_eval.iter().all(|i| !a_train.contains(i)));
    }

    #[test]
    fn mae_and_r2() {
        let truth = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean_absolute_error(&truth, &truth), 0.0);
        assert_eq!(r2_score(&truth, &truth), 1.0);
        assert_eq!(mean_absolute_error(&truth, &[2.0, 3.0, 4.0, 5.0]), 1.0);
        let mean = [2.5; 4];
        assert!(r2_score(&truth, &mean).abs() < 1e-12);
    }

    #[test]
    fn r2_is_finite_for_degenerate_inputs() {
        assert_eq!(r2_score(&[5.0], &[5.0]), 1.0);
        assert_eq!(r2_score(&[5.0], &[4.0]), 0.0);
        assert_eq!(r2_score(&[3.0, 3.0], &[2.0, 4.0]), 0.0);
    }
}
