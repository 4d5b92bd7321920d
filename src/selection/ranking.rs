use std::cmp::Ordering;

use crate::types::ScoredSentence;

/// Sentence indices by (score desc, index asc).
///
/// NaN scores rank below every real score.
pub fn rank_by_score(scored: &[ScoredSentence<'_>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scored.len()).collect();
    order.sort_by(|&a, &b| {
        // Descending score
        let score_cmp = sort_key(scored[b].score).total_cmp(&sort_key(scored[a].score));
        if score_cmp != Ordering::Equal {
            score_cmp
        } else {
            // Ascending index
            a.cmp(&b)
        }
    });

    debug_assert!(order.windows(2).all(|w| {
        let (a, b) = (sort_key(scored[w[0]].score), sort_key(scored[w[1]].score));
        a > b || (a == b && w[0] < w[1])
    }));

    order
}

/// Index of the highest score; the earliest one wins ties.
pub fn best_index(scored: &[ScoredSentence<'_>]) -> Option<usize> {
    rank_by_score(scored).first().copied()
}

fn sort_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else if score == 0.0 {
        // fold -0.0 into 0.0 so they tie
        0.0
    } else {
        score
    }
}
