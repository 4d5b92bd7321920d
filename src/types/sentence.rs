use serde::{Deserialize, Serialize};

use super::offsets::TokenSpan;

/// One unit of the passage that selection keeps or drops as a whole.
///
/// `text` is an exact substring of the passage, surrounding whitespace
/// included, starting at byte `offset`. `token_span` is relative to the
/// passage's first rendering token; `token_count` comes from the counting
/// tokenizer and is always non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    pub offset: usize,
    pub token_span: TokenSpan,
    pub token_count: usize,
}

/// A sentence paired with its importance score.
/// Holds a reference to avoid cloning sentence text before selection.
#[derive(Debug, Clone, Copy)]
pub struct ScoredSentence<'a> {
    pub sentence: &'a Sentence,
    pub score: f32,
}

impl<'a> ScoredSentence<'a> {
    pub fn new(sentence: &'a Sentence, score: f32) -> Self {
        Self { sentence, score }
    }

    pub fn token_count(&self) -> usize {
        self.sentence.token_count
    }

    pub fn text(&self) -> &'a str {
        &self.sentence.text
    }
}

/// Pair each sentence with the score at the same position.
pub fn zip_scores<'a>(sentences: &'a [Sentence], scores: &[f32]) -> Vec<ScoredSentence<'a>> {
    debug_assert_eq!(sentences.len(), scores.len());
    sentences
        .iter()
        .zip(scores.iter().copied())
        .map(|(sentence, score)| ScoredSentence::new(sentence, score))
        .collect()
}
