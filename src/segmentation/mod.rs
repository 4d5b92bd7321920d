//! Sentence segmentation adapter: external boundary detection, exact
//! resynchronization against the passage, length filtering and token
//! alignment.

pub mod rules;
pub mod sync;
pub mod word_count;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alignment::align_span;
use crate::tokenize::TokenCounter;
use crate::types::{CharSpan, CompressionError, ModelError, Sentence, TokenOffsets, TokenSpan};
pub use rules::RuleBoundaryDetector;
pub use sync::{resynchronize, RawSentence};
pub use word_count::count_words_multilingual;

/// Language of a passage, which picks the boundary rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Chinese,
    Code,
    Other,
}

/// External sentence boundary detector.
///
/// Fragments come back in passage order but need not reproduce the passage
/// verbatim; [`resynchronize`] restores exact text.
pub trait BoundaryDetector {
    fn split(&self, text: &str, language: Language) -> Result<Vec<String>, ModelError>;
}

impl<T: BoundaryDetector + ?Sized> BoundaryDetector for Box<T> {
    fn split(&self, text: &str, language: Language) -> Result<Vec<String>, ModelError> {
        (**self).split(text, language)
    }
}

/// Where the passage sits inside the rendered prompt.
#[derive(Debug, Clone, Copy)]
pub struct PassageLayout<'a> {
    pub offsets: &'a TokenOffsets,
    /// Byte offset of the passage's first char in the prompt.
    pub char_start: usize,
    /// Rendering tokens covering the passage.
    pub tokens: TokenSpan,
}

pub struct SentenceSegmenter<D> {
    detector: D,
    min_word_length: usize,
}

impl Default for SentenceSegmenter<RuleBoundaryDetector> {
    fn default() -> Self {
        Self {
            detector: RuleBoundaryDetector,
            min_word_length: 5,
        }
    }
}

impl<D: BoundaryDetector> SentenceSegmenter<D> {
    pub fn new(detector: D, min_word_length: usize) -> Self {
        Self {
            detector,
            min_word_length,
        }
    }

    pub fn min_word_length(&self) -> usize {
        self.min_word_length
    }

    /// Split `passage` into sentences aligned with the prompt's tokens.
    ///
    /// Sentences that are blank, shorter than the minimum word length, or
    /// empty to the counting tokenizer are dropped; survivors keep passage
    /// order and are renumbered densely by position in the returned vector.
    pub fn segment<C: TokenCounter + ?Sized>(
        &self,
        passage: &str,
        language: Language,
        layout: &PassageLayout<'_>,
        counter: &C,
    ) -> Result<Vec<Sentence>, CompressionError> {
        if passage.is_empty() {
            return Ok(Vec::new());
        }

        let fragments = self.detector.split(passage, language)?;
        let pieces = resynchronize(passage, &fragments);

        let mut sentences = Vec::with_capacity(pieces.len());
        for piece in &pieces {
            let cleaned = piece.text.trim();
            if cleaned.is_empty() || count_words_multilingual(cleaned) < self.min_word_length {
                continue;
            }

            // True passage offset, not a running sum of kept sentences: dropping a
            // short sentence must not shift the spans that follow it.
            let span = CharSpan::new(
                layout.char_start + piece.offset,
                layout.char_start + piece.offset + piece.text.len(),
            );
            let token_span = align_span(layout.offsets, span)?.relative_to(layout.tokens.first);

            let token_count = counter.count_tokens(cleaned);
            if token_count == 0 {
                continue;
            }

            sentences.push(Sentence {
                text: piece.text.to_string(),
                offset: piece.offset,
                token_span,
                token_count,
            });
        }

        debug!(
            fragments = fragments.len(),
            pieces = pieces.len(),
            kept = sentences.len(),
            min_word_length = self.min_word_length,
            "segmented passage"
        );

        Ok(sentences)
    }
}
