//! Relative score fusion for combining search results.

use std::collections::HashMap;
use ulid::Ulid;

/// Fuse result lists after min-max normalizing each one.
///
/// fused score = Σ (weight_i * normalized_score_i)
///
/// A list whose scores are all equal normalizes to 1.0 for positive scores
/// and 0.0 otherwise, so a list with no signal contributes nothing.
///
/// # Arguments
/// * `results` - Vector of (results, weight) pairs, each result an (id, score) pair
///
/// # Returns
/// Vector of (id, fused_score) pairs, sorted by fused score descending, then id ascending
pub fn relative_score_fusion(results: Vec<(Vec<(Ulid, f32)>, f32)>) -> Vec<(Ulid, f32)> {
    let mut scores: HashMap<Ulid, f32> = HashMap::new();

    for (result_list, weight) in results {
        let (min, max) = result_list
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), (_, s)| {
                (min.min(*s), max.max(*s))
            });
        let range = max - min;

        for (id, score) in result_list {
            let normalized = if range > 0.0 {
                (score - min) / range
            } else if score > 0.0 {
                1.0
            } else {
                0.0
            };
            *scores.entry(id).or_default() += normalized * weight;
        }
    }

    let mut fused: Vec<_> = scores.into_iter().collect();
    fused.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    fused
}
