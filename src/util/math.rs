//! Numeric helpers shared by the refinement pipelines.

use std::cmp::Ordering;

/// Returns the index and value of the maximum element.
///
/// Ties resolve to the earliest index; comparison uses `total_cmp` so the
/// result is deterministic for any input, NaN included.
pub(crate) fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        let better = match best {
            None => true,
            Some((_, best_value)) => value.total_cmp(&best_value) == Ordering::Greater,
        };
        if better {
            best = Some((idx, value));
        }
    }
    best
}

/// Numerically stable softmax over one score row, in place.
///
/// The row maximum is subtracted before exponentiation so large raw scores
/// do not overflow.
pub(crate) fn softmax_in_place(row: &mut [f32]) {
    if row.is_empty() {
        return;
    }
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for value in row.iter_mut() {
        *value = (*value - max).exp();
        sum += *value;
    }
    if sum > 0.0 {
        for value in row.iter_mut() {
            *value /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{argmax, softmax_in_place};

    #[test]
    fn argmax_returns_earliest_on_ties() {
        assert_eq!(argmax(&[0.5, 0.9, 0.9, 0.1]), Some((1, 0.9)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn softmax_row_sums_to_one() {
        let mut row = [0.0f32, 4.0, 0.0];
        softmax_in_place(&mut row);
        let sum: f32 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(row[1] > 0.9);
        assert!((row[0] - row[2]).abs() < 1e-7);
    }

    #[test]
    fn softmax_handles_large_scores() {
        let mut row = [1000.0f32, 1000.0];
        softmax_in_place(&mut row);
        assert!((row[0] - 0.5).abs() < 1e-6);
        assert!((row[1] - 0.5).abs() < 1e-6);
    }
}
