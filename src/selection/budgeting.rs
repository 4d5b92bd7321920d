use tracing::{debug, warn};

use super::assemble;
use super::ranking::rank_by_score;
use crate::types::{ScoredSentence, SelectionResult};

/// Greedy prefix selection under a token budget.
///
/// Walks sentences by (score desc, index asc) and stops at the first one that
/// would push the running total past `target_tokens`; cheaper sentences
/// further down are not tried. When not even the top sentence fits, it is
/// kept anyway so a non-empty input never yields an empty result.
pub fn select_by_budget(scored: &[ScoredSentence<'_>], target_tokens: usize) -> SelectionResult {
    if scored.is_empty() {
        return SelectionResult::empty();
    }

    let order = rank_by_score(scored);

    let mut kept = Vec::new();
    let mut tokens_used = 0;
    for &idx in &order {
        let next_tokens = tokens_used + scored[idx].token_count();
        if next_tokens > target_tokens {
            break;
        }
        kept.push(idx);
        tokens_used = next_tokens;
    }

    let forced = kept.is_empty();
    if forced {
        let best = order[0];
        warn!(
            target_tokens,
            index = best,
            tokens = scored[best].token_count(),
            "no sentence fits the token budget, keeping the highest-scoring one"
        );
        kept.push(best);
    }

    debug!(
        selected = kept.len(),
        considered = scored.len(),
        target_tokens,
        tokens_used,
        "token budget selection"
    );

    assemble(scored, kept, forced)
}
