//! Turns captured attention into one importance score per sentence.
//!
//! Both scoring modes share the same front half: attention from every
//! selected head×layer combination is restricted to the passage keys and
//! L1-normalized ([`attention_ratios`]), then averaged over each sentence's
//! token span ([`sentence_features`]). Raw mode collapses the feature vector
//! to its mean and min-max rescales; classifier mode hands the vectors to a
//! trained detector.

pub mod features;
pub mod provider;
pub mod ratios;
pub mod tensor;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::{CompressionError, Sentence, TokenSpan};
pub use features::{min_max_normalize, raw_scores, sentence_features};
pub use provider::{AttentionProvider, AttentionRequest, Classifier, LogisticDetector, QueryScope};
pub use ratios::{attention_ratios, LayerScope, QueryWindow, MIN_ATTENTION_MASS};
pub use tensor::{AttentionCapture, AttentionShape, AttentionTensor, HeadAttention, HeadSelection};

/// Rows are passage key tokens, columns are head×layer combinations.
pub type RatioMatrix = Array2<f32>;

/// Rows are sentences, columns are head×layer combinations.
pub type FeatureMatrix = Array2<f32>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Attention capture is empty")]
    EmptyCapture,

    #[error("No captured head matches the configured head/layer selection")]
    NoMatchingHeads,

    #[error("Attention tensor shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Only batch size 1 is supported, got {0}")]
    UnsupportedBatch(usize),

    #[error("Key index {last} out of bounds for {available} captured positions")]
    KeyRangeOutOfBounds { last: usize, available: usize },

    #[error("Capture holds only the final query; all-query attention needs the full query axis")]
    QueryAxisMissing,

    #[error("Query start {start} out of bounds for {available} captured query positions")]
    QueryStartOutOfBounds { start: usize, available: usize },

    #[error("Classifier returned {actual} probabilities for {expected} sentences")]
    ClassifierOutput { expected: usize, actual: usize },
}

/// How sentence scores are derived from attention features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Mean normalized attention, min-max rescaled.
    Raw,
    /// Probability from a trained detector.
    #[default]
    Classifier,
}

/// Scoring mode bound to its collaborator.
#[derive(Clone, Copy)]
pub enum Scoring<'c> {
    Raw,
    Classifier(&'c dyn Classifier),
}

/// Which slice of the capture feeds the features.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionPlan<'a> {
    /// Rendering tokens covering the passage, absolute.
    pub passage: TokenSpan,
    pub layers: LayerScope,
    pub window: QueryWindow,
    pub heads: Option<&'a HeadSelection>,
}

/// Score every sentence from one attention capture.
///
/// Pure with respect to its inputs: identical captures and spans always give
/// identical scores.
pub fn score_sentences(
    capture: &AttentionCapture,
    plan: &ExtractionPlan<'_>,
    sentences: &[Sentence],
    scoring: Scoring<'_>,
) -> Result<Vec<f32>, CompressionError> {
    let ratios = attention_ratios(capture, plan.passage, plan.layers, plan.window, plan.heads)?;

    let spans: Vec<TokenSpan> = sentences.iter().map(|s| s.token_span).collect();
    let features = sentence_features(&ratios, &spans)?;

    debug!(
        sentences = features.nrows(),
        features = features.ncols(),
        "aggregated sentence attention features"
    );

    match scoring {
        Scoring::Raw => Ok(raw_scores(&features)),
        Scoring::Classifier(classifier) => {
            let probs = classifier.predict_proba(&features)?;
            if probs.len() != sentences.len() {
                return Err(ExtractionError::ClassifierOutput {
                    expected: sentences.len(),
                    actual: probs.len(),
                }
                .into());
            }
            Ok(probs)
        }
    }
}
