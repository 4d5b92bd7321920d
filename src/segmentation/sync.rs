use tracing::debug;

use crate::alignment::ceil_char_boundary;

/// Characters of the next fragment used to find where it starts.
const PROBE_CHARS: usize = 10;

/// A slice of the passage produced by resynchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSentence<'a> {
    pub text: &'a str,
    /// Byte offset of `text` inside the passage.
    pub offset: usize,
}

/// Rebuild detector fragments as exact, gap-free slices of `passage`.
///
/// Each piece runs from the cursor up to where the next fragment starts, so
/// inter-sentence whitespace stays attached to the preceding sentence and the
/// pieces concatenate back to `passage` byte for byte. If a fragment cannot be
/// found (the detector rewrote the text), everything from the cursor on
/// becomes one final piece.
pub fn resynchronize<'a, S: AsRef<str>>(passage: &'a str, fragments: &[S]) -> Vec<RawSentence<'a>> {
    let fragments: Vec<&str> = fragments
        .iter()
        .map(|f| f.as_ref().trim())
        .filter(|f| !f.is_empty())
        .collect();

    let mut pieces = Vec::with_capacity(fragments.len().max(1));
    let mut cursor = 0;

    for (i, fragment) in fragments.iter().enumerate() {
        let Some(next) = fragments.get(i + 1) else {
            break;
        };

        let probe = char_prefix(next, PROBE_CHARS);
        let search_from = ceil_char_boundary(passage, cursor + fragment.len());

        match passage[search_from..].find(probe).map(|pos| pos + search_from) {
            Some(next_start) if next_start > cursor => {
                pieces.push(RawSentence {
                    text: &passage[cursor..next_start],
                    offset: cursor,
                });
                cursor = next_start;
            }
            _ => {
                debug!(
                    fragment = i + 1,
                    cursor,
                    "next fragment not found in passage, taking remaining text as one sentence"
                );
                break;
            }
        }
    }

    if cursor < passage.len() {
        pieces.push(RawSentence {
            text: &passage[cursor..],
            offset: cursor,
        });
    }

    pieces
}

fn char_prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
