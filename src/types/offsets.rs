use serde::{Deserialize, Serialize};

/// Per-token `(start, end)` byte offsets into the text that was tokenized.
///
/// Produced once by the rendering tokenizer and read-only afterwards. Offsets
/// are expected in ascending, non-overlapping order; special tokens commonly
/// carry the empty range `(0, 0)` and never overlap anything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenOffsets {
    inner: Vec<(usize, usize)>,
}

impl TokenOffsets {
    pub fn new(offsets: Vec<(usize, usize)>) -> Self {
        debug_assert!(
            offsets.iter().all(|(start, end)| start <= end),
            "token offsets must have start <= end"
        );
        Self { inner: offsets }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(usize, usize)> {
        self.inner.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.inner.iter().copied()
    }
}

impl From<Vec<(usize, usize)>> for TokenOffsets {
    fn from(offsets: Vec<(usize, usize)>) -> Self {
        Self::new(offsets)
    }
}

/// Half-open byte interval `[start, end)` inside the rendered prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharSpan {
    pub start: usize,
    pub end: usize,
}

impl CharSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Overlap rule shared by every alignment: the token ends after the span
    /// starts and starts before the span ends.
    pub fn overlaps_token(&self, token: (usize, usize)) -> bool {
        token.1 > self.start && token.0 < self.end
    }
}

/// Inclusive range of token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    pub first: usize,
    pub last: usize,
}

impl TokenSpan {
    pub fn new(first: usize, last: usize) -> Self {
        debug_assert!(first <= last, "token span {first}..={last} is inverted");
        Self { first, last }
    }

    /// Number of tokens covered; never zero.
    pub fn token_len(&self) -> usize {
        self.last - self.first + 1
    }

    /// Re-express this span relative to `origin` (typically the passage's first token).
    pub fn relative_to(&self, origin: usize) -> TokenSpan {
        TokenSpan::new(self.first - origin, self.last - origin)
    }
}
