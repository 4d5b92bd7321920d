pub mod compression_bundle;
pub mod identifiers;
pub mod offsets;
pub mod sentence;

pub use compression_bundle::{
    CompressionError, CompressionMetadata, CompressionResult, CompressionTarget, ModelError,
    SelectionResult,
};
pub use identifiers::{ConfigFingerprint, PassageVersion};
pub use offsets::{CharSpan, TokenOffsets, TokenSpan};
pub use sentence::{zip_scores, ScoredSentence, Sentence};
