use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::prompt::PromptTemplate;
use crate::attention::{HeadSelection, LayerScope, QueryScope, ScoringMode};
use crate::types::{CompressionTarget, ConfigFingerprint};

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Classifier scoring is configured but no classifier was supplied")]
    MissingClassifier,

    #[error("head_selection is set but selects no heads")]
    EmptyHeadSelection,

    #[error("Compression rate must be within 0.0..=1.0, got {0}")]
    InvalidCompressionRate(f64),

    #[error("Threshold must be a finite number, got {0}")]
    InvalidThreshold(f32),

    #[error("Invalid prompt template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid chunking: chunk_size {chunk_size}, overlap {overlap}")]
    InvalidChunking { chunk_size: usize, overlap: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Everything that shapes a compression besides the passage itself.
///
/// Missing JSON fields take their [`CompressorConfig::v0`] values; unknown
/// fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressorConfig {
    pub scoring: ScoringMode,
    pub layers: LayerScope,
    pub queries: QueryScope,
    pub head_selection: Option<HeadSelection>,
    pub min_word_length: usize,
    pub default_target: CompressionTarget,
    pub prompt_template: PromptTemplate,
    /// Log kept sentences ranked by score after every call.
    pub report_sentence_scores: bool,
}

impl CompressorConfig {
    pub fn v0() -> Self {
        Self {
            scoring: ScoringMode::Classifier,
            layers: LayerScope::All,
            queries: QueryScope::LastToken,
            head_selection: None,
            min_word_length: 5,
            default_target: CompressionTarget::Rate(0.5),
            prompt_template: PromptTemplate::default(),
            report_sentence_scores: false,
        }
    }

    /// Raw attention scoring; no classifier needed.
    pub fn raw() -> Self {
        Self {
            scoring: ScoringMode::Raw,
            ..Self::v0()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let f = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(f)?)
    }

    /// Check everything that does not depend on runtime collaborators.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.head_selection.as_ref().is_some_and(HeadSelection::is_empty) {
            return Err(ConfigurationError::EmptyHeadSelection);
        }
        validate_target(self.default_target)?;
        self.prompt_template.validate()?;
        Ok(())
    }

    pub fn fingerprint(&self) -> Result<ConfigFingerprint, ConfigurationError> {
        let json = serde_json::to_vec(self)?;
        Ok(ConfigFingerprint::from_canonical_json(&json))
    }
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self::v0()
    }
}

pub(crate) fn validate_target(target: CompressionTarget) -> Result<(), ConfigurationError> {
    match target {
        CompressionTarget::Tokens(_) => Ok(()),
        CompressionTarget::Rate(rate) if (0.0..=1.0).contains(&rate) => Ok(()),
        CompressionTarget::Rate(rate) => Err(ConfigurationError::InvalidCompressionRate(rate)),
        CompressionTarget::Threshold(t) if t.is_finite() => Ok(()),
        CompressionTarget::Threshold(t) => Err(ConfigurationError::InvalidThreshold(t)),
    }
}
