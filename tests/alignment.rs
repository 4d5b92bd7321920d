use attention_compress::alignment::{align_span, locate, locate_from, AlignmentError};
use attention_compress::types::{CharSpan, TokenOffsets, TokenSpan};

// "<s>Hello brave new world"  with a zero-width BOS token
fn offsets() -> TokenOffsets {
    TokenOffsets::new(vec![(0, 0), (0, 5), (5, 11), (11, 15), (15, 21)])
}

const PROMPT: &str = "Hello brave new world";

#[test]
fn locate_returns_inclusive_overlapping_tokens() {
    let span = locate(&offsets(), PROMPT, "brave new").unwrap();
    assert_eq!(span, TokenSpan::new(2, 3));
}

#[test]
fn partial_token_overlap_counts() {
    // "llo bra" touches "Hello" and " brave"
    let span = locate(&offsets(), PROMPT, "llo bra").unwrap();
    assert_eq!(span, TokenSpan::new(1, 2));
}

#[test]
fn zero_width_tokens_never_overlap() {
    let span = locate(&offsets(), PROMPT, "H").unwrap();
    assert_eq!(span, TokenSpan::new(1, 1));
}

#[test]
fn missing_and_empty_needles_fail() {
    assert!(matches!(
        locate(&offsets(), PROMPT, "galaxy"),
        Err(AlignmentError::NeedleNotFound { .. })
    ));
    assert_eq!(locate(&offsets(), PROMPT, ""), Err(AlignmentError::EmptyNeedle));
}

#[test]
fn span_outside_every_token_fails() {
    let offsets = TokenOffsets::new(vec![(0, 0), (0, 5)]);
    let err = align_span(&offsets, CharSpan::new(6, 9)).unwrap_err();
    assert_eq!(err, AlignmentError::NoOverlappingToken { start: 6, end: 9 });
}

#[test]
fn first_occurrence_wins_unless_searching_later() {
    let prompt = "ab ab";
    let offsets = TokenOffsets::new(vec![(0, 2), (2, 5)]);

    assert_eq!(locate(&offsets, prompt, "ab").unwrap(), TokenSpan::new(0, 0));
    assert_eq!(locate_from(&offsets, prompt, "ab", 1).unwrap(), TokenSpan::new(1, 1));
}

#[test]
fn multibyte_search_start_is_snapped_forward() {
    let prompt = "姚明 and 姚明";
    let offsets = TokenOffsets::new(vec![(0, 6), (6, 10), (10, 17)]);

    // byte 1 sits inside the first ideograph
    let span = locate_from(&offsets, prompt, "姚明", 1).unwrap();
    assert_eq!(span, TokenSpan::new(2, 2));
}
