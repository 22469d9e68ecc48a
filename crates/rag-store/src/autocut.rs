//! Autocut: bound a ranked result list at its natural score drops.

/// Number of results to keep from a descending score list.
///
/// The scores are rescaled so the first is 1 and the last 0, and compared
/// with the straight line between them. A result that sits highest above
/// that line relative to its neighbours marks the end of a cluster that is
/// followed by a drop. The list is cut after the `jumps`-th such result.
/// Lists without enough drops, lists of at most one result, and flat lists
/// are kept whole.
pub fn autocut(scores: &[f32], jumps: u32) -> usize {
    let len = scores.len();
    if len <= 1 || jumps == 0 {
        return len;
    }

    let first = scores[0];
    let last = scores[len - 1];
    let span = first - last;
    if span <= 0.0 {
        return len;
    }

    let step = 1.0 / (len - 1) as f32;
    let diff: Vec<f32> = scores
        .iter()
        .enumerate()
        .map(|(i, score)| (score - last) / span - (1.0 - i as f32 * step))
        .collect();

    let mut found = 0;
    for i in 1..len - 1 {
        if diff[i] > diff[i - 1] && diff[i] > diff[i + 1] {
            found += 1;
            if found >= jumps {
                return i + 1;
            }
        }
    }

    len
}
