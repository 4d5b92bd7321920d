/// CJK Unified Ideographs block.
fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Length of `text` in words, counting each CJK ideograph as a word.
///
/// Whitespace-delimited tokens count only when they contain an alphabetic
/// character, so bare numbers and punctuation runs are ignored. When the text
/// contains any CJK ideograph the ideographs are counted individually and the
/// alphabetic tokens are added on top.
pub fn count_words_multilingual(text: &str) -> usize {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    let alphabetic_words = text
        .split_whitespace()
        .filter(|word| word.chars().any(char::is_alphabetic))
        .count();

    let ideographs = text.chars().filter(|c| is_cjk(*c)).count();
    ideographs + alphabetic_words
}
