use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::{ConfigFingerprint, PassageVersion};
use super::sentence::Sentence;
use crate::alignment::AlignmentError;
use crate::attention::ExtractionError;
use crate::compression::ConfigurationError;

/// What a compression call should aim for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CompressionTarget {
    /// Keep at most this many tokens (clamped to the passage total).
    Tokens(usize),
    /// Drop this fraction of the passage tokens, `0.0..=1.0`.
    Rate(f64),
    /// Keep every sentence scoring at least this value.
    Threshold(f32),
}

/// Outcome of one selection pass over scored sentences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Ascending, duplicate-free sentence indices.
    pub kept_indices: Vec<usize>,
    /// Kept sentences in passage order, joined by a single space.
    pub compressed_text: String,
    pub kept_tokens: usize,
    pub total_tokens: usize,
    /// `1 - kept_tokens / total_tokens`, or 0.0 when there is nothing to compress.
    pub achieved_ratio: f32,
    /// The force-include fallback fired: nothing met the target on its own.
    pub forced: bool,
}

impl SelectionResult {
    pub fn empty() -> Self {
        Self {
            kept_indices: Vec::new(),
            compressed_text: String::new(),
            kept_tokens: 0,
            total_tokens: 0,
            achieved_ratio: 0.0,
            forced: false,
        }
    }
}

/// Metadata describing how a compression result was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionMetadata {
    pub passage_version: PassageVersion,
    pub config_fingerprint: ConfigFingerprint,
    pub target: CompressionTarget,
    /// Token budget the greedy selector ran with, when the target was a budget.
    pub resolved_budget: Option<usize>,
    pub forced_fallback: bool,
    pub started_at: DateTime<Utc>, // informational only
    pub elapsed_ms: u64,
}

/// The final, immutable record of one compression call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionResult {
    pub compressed_text: String,
    pub original_token_count: usize,
    pub compressed_token_count: usize,
    pub achieved_ratio: f32,
    pub sentence_scores: Vec<f32>,
    pub sentences: Vec<Sentence>,
    pub kept_indices: Vec<usize>,
    pub metadata: CompressionMetadata,
}

/// Failure reported by an external collaborator (tokenizer, attention
/// provider, classifier). The message is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{source_name} failed: {message}")]
pub struct ModelError {
    pub source_name: String,
    pub message: String,
}

impl ModelError {
    pub fn new(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("Alignment error: {0}")]
    Alignment(#[from] AlignmentError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
