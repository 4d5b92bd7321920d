//! Attention-guided context compression for LLM prompts.
//!
//! `attention-compress` shrinks a passage to a token budget (or a score
//! threshold) by keeping the sentences a causal language model attends to
//! most when reading the passage alongside a question. It aligns sentence
//! boundaries with the model's subword tokens, turns captured attention into
//! one score per sentence, and selects sentences deterministically:
//! identical inputs always produce identical outputs.
//!
//! Model execution, tokenization and sentence boundary detection stay behind
//! traits ([`tokenize::OffsetTokenizer`], [`tokenize::TokenCounter`],
//! [`attention::AttentionProvider`], [`attention::Classifier`],
//! [`segmentation::BoundaryDetector`]); this crate owns the alignment,
//! scoring and selection between them.

pub mod alignment;
pub mod attention;
pub mod chunking;
pub mod compression;
pub mod segmentation;
pub mod selection;
pub mod tokenize;
pub mod types;

pub use compression::{Compressor, CompressorConfig};
pub use segmentation::Language;
pub use types::{CompressionError, CompressionResult, CompressionTarget};
