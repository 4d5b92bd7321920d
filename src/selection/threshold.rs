use tracing::{debug, warn};

use super::assemble;
use super::ranking::best_index;
use crate::types::{ScoredSentence, SelectionResult};

/// Keep every sentence scoring at least `threshold`.
///
/// If none qualifies the single best sentence is kept and the fallback is
/// reported through `SelectionResult::forced` and a warning event.
pub fn select_by_threshold(scored: &[ScoredSentence<'_>], threshold: f32) -> SelectionResult {
    let mut kept: Vec<usize> = scored
        .iter()
        .enumerate()
        .filter(|(_, s)| s.score >= threshold)
        .map(|(i, _)| i)
        .collect();

    let mut forced = false;
    if kept.is_empty() {
        let Some(best) = best_index(scored) else {
            return SelectionResult::empty();
        };
        warn!(
            threshold,
            index = best,
            score = scored[best].score,
            "no sentence met the threshold, keeping the highest-scoring one"
        );
        kept.push(best);
        forced = true;
    }

    debug!(
        selected = kept.len(),
        considered = scored.len(),
        threshold,
        "threshold selection"
    );

    assemble(scored, kept, forced)
}
