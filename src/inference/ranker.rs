//! Posterior ranking: softmax and top-K selection.

use std::cmp::Ordering;

/// Softmax over a logit vector.
///
/// The maximum logit is subtracted before exponentiation for numerical
/// stability; the result is invariant to adding a constant to every logit.
/// An empty input yields an empty output.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let Some(max) = logits
        .iter()
        .copied()
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    else {
        return Vec::new();
    };

    let exps: Vec<f32> = logits
        .iter()
        .map(|&logit| {
            #[allow(clippy::cast_possible_truncation)]
            let e = f64::from(logit - max).exp() as f32;
            e
        })
        .collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Select the `k` most probable classes.
///
/// Returns `min(k, n)` pairs of `(class_index, probability)` in descending
/// probability order. Equal probabilities keep ascending index order (the
/// underlying sort is stable).
pub fn top_k(probabilities: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut indices: Vec<usize> = (0..probabilities.len()).collect();
    indices.sort_by(|&a, &b| {
        probabilities[b]
            .partial_cmp(&probabilities[a])
            .unwrap_or(Ordering::Equal)
    });

    indices
        .into_iter()
        .take(k.min(probabilities.len()))
        .map(|index| (index, probabilities[index]))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, -1.0, 0.5]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_softmax_is_shift_invariant() {
        let logits = [0.3, -2.0, 5.0, 1.1];
        let shifted: Vec<f32> = logits.iter().map(|l| l + 100.0).collect();

        let a = softmax(&logits);
        let b = softmax(&shifted);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_softmax_handles_large_logits() {
        // Without the max subtraction these would overflow to infinity.
        let probs = softmax(&[1000.0, 999.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1]);
    }

    #[test]
    fn test_softmax_empty_input() {
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn test_top_k_returns_min_of_k_and_n() {
        let probs = [0.1, 0.4, 0.2, 0.3];
        assert_eq!(top_k(&probs, 2).len(), 2);
        assert_eq!(top_k(&probs, 10).len(), 4);
        assert_eq!(top_k(&probs, 0).len(), 0);
    }

    #[test]
    fn test_top_k_sorted_descending_and_subset_of_ranking() {
        let probs = [0.05, 0.5, 0.15, 0.3];
        let top = top_k(&probs, 3);
        assert_eq!(top[0], (1, 0.5));
        assert_eq!(top[1], (3, 0.3));
        assert_eq!(top[2], (2, 0.15));

        let full = top_k(&probs, probs.len());
        assert_eq!(&full[..3], &top[..]);
    }

    #[test]
    fn test_top_k_ties_keep_ascending_index_order() {
        let probs = [0.25, 0.25, 0.25, 0.25];
        let top = top_k(&probs, 4);
        let order: Vec<usize> = top.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }
}
