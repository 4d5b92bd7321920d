//! Overlapping windows for passages too long for one attention pass.

use crate::compression::ConfigurationError;

/// Split `text` into windows of at most `chunk_size` chars, each starting
/// `overlap` chars before the previous one ended.
///
/// A window prefers to end just after its last `.` or `\n`, provided that
/// break lies past the window's midpoint. Text no longer than `chunk_size`
/// comes back as a single chunk. Every window starts at least one char after
/// the previous one, so the loop always terminates.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ConfigurationError> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(ConfigurationError::InvalidChunking { chunk_size, overlap });
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= chunk_size {
        return Ok(vec![text.to_string()]);
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = start + chunk_size;
        if end >= chars.len() {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        let window = &chars[start..end];
        let break_point = window.iter().rposition(|&c| c == '.' || c == '\n');

        let next_start = match break_point {
            Some(bp) if bp > chunk_size / 2 => {
                chunks.push(window[..=bp].iter().collect());
                start + bp + 1 - overlap.min(bp + 1)
            }
            _ => {
                chunks.push(window.iter().collect());
                end - overlap
            }
        };
        start = next_start.max(start + 1);
    }

    Ok(chunks)
}
