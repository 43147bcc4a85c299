//! Candidate scoring for priority selection.

use std::cmp::Ordering;

use crate::tracker::detection::Detection;

/// Weights for combining centrality and tracking history into one score.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub center_weight: f32,
    pub history_weight: f32,
    /// History count at which the history term saturates
    pub history_saturation: u32,
}

/// A candidate together with its score for the current tick.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub detection: &'a Detection,
    pub score: f32,
    pub history: u32,
}

/// `center_weight * (1 - d) + history_weight * min(history / saturation, 1)`,
/// with `d` the distance from box center to screen center, clamped to `[0, 1]`.
pub fn candidate_score(detection: &Detection, history: u32, weights: &ScoreWeights) -> f32 {
    let centrality = 1.0 - detection.rect().distance_from_screen_center().clamp(0.0, 1.0);
    let evidence = if weights.history_saturation == 0 {
        1.0
    } else {
        (history as f32 / weights.history_saturation as f32).min(1.0)
    };
    weights.center_weight * centrality + weights.history_weight * evidence
}

/// Higher score first; equal scores fall back to the lexicographically smaller
/// id so that results never depend on input order.
pub fn rank(a: &ScoredCandidate<'_>, b: &ScoredCandidate<'_>) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.detection.id.cmp(&b.detection.id))
}

/// Best candidate by [`rank`], if any.
pub fn best<'a, 'b>(
    candidates: impl IntoIterator<Item = &'b ScoredCandidate<'a>>,
) -> Option<ScoredCandidate<'a>>
where
    'a: 'b,
{
    candidates.into_iter().copied().min_by(rank)
}
