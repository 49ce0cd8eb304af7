//! Top-K ranking of probability vectors.
//!
//! Ranking is deterministic: higher probability first, equal probabilities
//! ordered by ascending index, NaN entries after every finite value.

use std::cmp::Ordering;

/// Compare two `(index, probability)` entries for ranking order.
fn rank_order(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    match (a.1.is_nan(), b.1.is_nan()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => a.0.cmp(&b.0),
        (false, false) => b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)),
    }
}

/// Indices of all entries, most probable first.
pub fn ranked_indices(probs: &[f64]) -> Vec<usize> {
    let mut entries: Vec<(usize, f64)> = probs.iter().copied().enumerate().collect();
    entries.sort_by(rank_order);
    entries.into_iter().map(|(i, _)| i).collect()
}

/// Indices of the `k` most probable entries.
///
/// `k` larger than the input length returns every index.
pub fn top_k(probs: &[f64], k: usize) -> Vec<usize> {
    let mut ranked = ranked_indices(probs);
    ranked.truncate(k);
    ranked
}
