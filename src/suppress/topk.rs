//! Deterministic Top-K selection over scored keep-sets.

/// Returns up to `k` of the given indices with the highest scores.
///
/// Output is ordered by descending score with ties broken by ascending
/// index, so equal-score selections are deterministic.
pub(crate) fn top_k_by_score(indices: &[usize], scores: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = indices.to_vec();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then_with(|| a.cmp(&b)));
    order.truncate(k);
    order
}
