pub mod budgeting;
pub mod ranking;
pub mod threshold;

use crate::types::{CompressionTarget, ScoredSentence, SelectionResult};
pub use budgeting::select_by_budget;
pub use ranking::{best_index, rank_by_score};
pub use threshold::select_by_threshold;

/// Relative tolerance for snapping `Rate` products onto whole tokens.
const RATE_EPSILON: f64 = 1e-9;

/// A compression target resolved against a concrete passage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionTarget {
    Budget(usize),
    Threshold(f32),
}

impl SelectionTarget {
    /// `Tokens(n)` clamps to `total_tokens`; `Rate(r)` keeps
    /// `floor(total_tokens * (1 - r))` tokens.
    pub fn resolve(target: CompressionTarget, total_tokens: usize) -> Self {
        match target {
            CompressionTarget::Tokens(n) => SelectionTarget::Budget(n.min(total_tokens)),
            CompressionTarget::Rate(rate) => {
                let keep = floor_decimal(total_tokens as f64 * (1.0 - rate));
                SelectionTarget::Budget(keep.clamp(0.0, total_tokens as f64) as usize)
            }
            CompressionTarget::Threshold(t) => SelectionTarget::Threshold(t),
        }
    }

    pub fn budget(&self) -> Option<usize> {
        match self {
            SelectionTarget::Budget(n) => Some(*n),
            SelectionTarget::Threshold(_) => None,
        }
    }
}

/// Floor that treats a product within rounding error of an integer as that
/// integer, so `10 * (1 - 0.9)` keeps 1 token rather than 0.
fn floor_decimal(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() <= RATE_EPSILON * nearest.abs().max(1.0) {
        nearest
    } else {
        value.floor()
    }
}

/// Run the strategy matching `target`.
pub fn select(scored: &[ScoredSentence<'_>], target: SelectionTarget) -> SelectionResult {
    match target {
        SelectionTarget::Budget(tokens) => select_by_budget(scored, tokens),
        SelectionTarget::Threshold(threshold) => select_by_threshold(scored, threshold),
    }
}

/// Restore passage order and join the kept sentences.
fn assemble(scored: &[ScoredSentence<'_>], mut kept: Vec<usize>, forced: bool) -> SelectionResult {
    kept.sort_unstable();
    kept.dedup();

    let total_tokens: usize = scored.iter().map(ScoredSentence::token_count).sum();
    let kept_tokens: usize = kept.iter().map(|&i| scored[i].token_count()).sum();

    let compressed_text = kept
        .iter()
        .map(|&i| scored[i].text())
        .collect::<Vec<_>>()
        .join(" ");

    let achieved_ratio = if total_tokens == 0 {
        0.0
    } else {
        1.0 - kept_tokens as f32 / total_tokens as f32
    };

    debug_assert!(kept.windows(2).all(|w| w[0] < w[1]));
    debug_assert!(kept_tokens <= total_tokens);

    SelectionResult {
        kept_indices: kept,
        compressed_text,
        kept_tokens,
        total_tokens,
        achieved_ratio,
        forced,
    }
}
