//! Maps byte spans of the rendered prompt onto rendering-token indices.

use thiserror::Error;

use crate::types::{CharSpan, TokenOffsets, TokenSpan};

/// Longest needle excerpt carried in an error message.
const NEEDLE_PREVIEW_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    #[error("Cannot align an empty needle")]
    EmptyNeedle,

    #[error("Needle not found in prompt: {needle:?}")]
    NeedleNotFound { needle: String },

    #[error("No token overlaps bytes {start}..{end}")]
    NoOverlappingToken { start: usize, end: usize },
}

/// Locate the first occurrence of `needle` in `haystack` and return the
/// inclusive range of tokens overlapping it.
pub fn locate(
    offsets: &TokenOffsets,
    haystack: &str,
    needle: &str,
) -> Result<TokenSpan, AlignmentError> {
    locate_from(offsets, haystack, needle, 0)
}

/// Like [`locate`], but only matches starting at or after byte `from`.
///
/// `from` is snapped forward to the next char boundary.
pub fn locate_from(
    offsets: &TokenOffsets,
    haystack: &str,
    needle: &str,
    from: usize,
) -> Result<TokenSpan, AlignmentError> {
    let span = find_span(haystack, needle, from)?;
    align_span(offsets, span)
}

/// Byte span of the first occurrence of `needle` at or after `from`.
pub fn find_span(haystack: &str, needle: &str, from: usize) -> Result<CharSpan, AlignmentError> {
    if needle.is_empty() {
        return Err(AlignmentError::EmptyNeedle);
    }

    let from = ceil_char_boundary(haystack, from);
    let start = haystack[from..]
        .find(needle)
        .map(|pos| pos + from)
        .ok_or_else(|| AlignmentError::NeedleNotFound {
            needle: preview(needle),
        })?;

    Ok(CharSpan::new(start, start + needle.len()))
}

/// First and last token (in token order) overlapping `span`.
pub fn align_span(offsets: &TokenOffsets, span: CharSpan) -> Result<TokenSpan, AlignmentError> {
    let mut overlapping = offsets
        .iter()
        .enumerate()
        .filter(|(_, token)| span.overlaps_token(*token))
        .map(|(index, _)| index);

    let first = overlapping.next().ok_or(AlignmentError::NoOverlappingToken {
        start: span.start,
        end: span.end,
    })?;
    let last = overlapping.last().unwrap_or(first);

    Ok(TokenSpan::new(first, last))
}

/// Smallest char boundary of `text` at or after `index`, capped at `text.len()`.
pub(crate) fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    (index..=text.len())
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(text.len())
}

fn preview(needle: &str) -> String {
    if needle.chars().count() <= NEEDLE_PREVIEW_CHARS {
        needle.to_string()
    } else {
        let head: String = needle.chars().take(NEEDLE_PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}
