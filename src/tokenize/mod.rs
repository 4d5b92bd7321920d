//! Tokenizer seams. Real tokenizers live outside this crate; it only needs
//! offsets from the rendering tokenizer and counts from the counting one.

use crate::types::{ModelError, TokenOffsets};

/// Token ids plus per-token byte offsets for one tokenization call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Encoding {
    pub ids: Vec<u32>,
    pub offsets: TokenOffsets,
}

impl Encoding {
    pub fn new(ids: Vec<u32>, offsets: TokenOffsets) -> Self {
        debug_assert_eq!(ids.len(), offsets.len(), "one offset pair per token id");
        Self { ids, offsets }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// The tokenizer of the attention model, with offset mapping.
pub trait OffsetTokenizer {
    fn tokenize(&self, text: &str) -> Result<Encoding, ModelError>;
}

/// Tokenizer used only for budget arithmetic.
pub trait TokenCounter {
    fn count_tokens(&self, content: &str) -> usize;
}

/// Approximate GPT-style tokenization
/// tokens(content) := ceil(len(content) / 4)
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTokenCounter;

impl TokenCounter for ApproxTokenCounter {
    fn count_tokens(&self, content: &str) -> usize {
        content.len().div_ceil(4)
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn count_tokens(&self, content: &str) -> usize {
        (**self).count_tokens(content)
    }
}

impl<T: OffsetTokenizer + ?Sized> OffsetTokenizer for &T {
    fn tokenize(&self, text: &str) -> Result<Encoding, ModelError> {
        (**self).tokenize(text)
    }
}
