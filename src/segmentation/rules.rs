use std::sync::LazyLock;

use regex::Regex;

use super::{BoundaryDetector, Language};
use crate::types::ModelError;

static LATIN_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.!?]+["'”’)\]]*\s+"#).expect("latin boundary regex is valid")
});

static CJK_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[。！？!?]+[”’」』）)]*").expect("cjk boundary regex is valid")
});

static PARAGRAPH_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").expect("paragraph boundary regex is valid"));

/// Punctuation-driven boundary detector.
///
/// English and code split after terminal punctuation followed by whitespace,
/// Chinese after full-width terminators, anything else on blank lines. It
/// makes no attempt at abbreviations; plug in a real segmenter through
/// [`BoundaryDetector`] when that matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBoundaryDetector;

impl BoundaryDetector for RuleBoundaryDetector {
    fn split(&self, text: &str, language: Language) -> Result<Vec<String>, ModelError> {
        let boundary: &Regex = match language {
            Language::English | Language::Code => &LATIN_BOUNDARY,
            Language::Chinese => &CJK_BOUNDARY,
            Language::Other => &PARAGRAPH_BOUNDARY,
        };
        Ok(split_after(text, boundary))
    }
}

fn split_after(text: &str, boundary: &Regex) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut last = 0;

    for m in boundary.find_iter(text) {
        fragments.push(&text[last..m.end()]);
        last = m.end();
    }
    fragments.push(&text[last..]);

    fragments
        .into_iter()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}
