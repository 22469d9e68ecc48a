//! Min-max score normalization across a candidate set.

/// Maps raw scores of one candidate set onto `[0, 1]`.
///
/// When every candidate has the same score (including a single candidate),
/// every score normalizes to `1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreNormalizer {
    min: f32,
    max: f32,
}

impl ScoreNormalizer {
    /// Build from the raw score of every candidate. `None` for an empty set.
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        let (first, rest) = scores.split_first()?;
        let (min, max) = rest
            .iter()
            .fold((*first, *first), |(min, max), &s| (min.min(s), max.max(s)));
        Some(Self { min, max })
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// True when all candidates share one score.
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    /// Normalize a raw score from the same candidate set.
    ///
    /// Computed in `f64`: the spread of two finite `f32` scores can exceed `f32::MAX`.
    pub fn normalize(&self, score: f32) -> f32 {
        if self.is_degenerate() {
            return 1.0;
        }
        let min = f64::from(self.min);
        let range = f64::from(self.max) - min;
        ((f64::from(score) - min) / range).clamp(0.0, 1.0) as f32
    }
}
