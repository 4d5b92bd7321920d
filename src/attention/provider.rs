use std::path::Path;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::ratios::LayerScope;
use super::tensor::{AttentionCapture, HeadSelection};
use super::FeatureMatrix;
use crate::compression::ConfigurationError;
use crate::types::ModelError;

/// Which query rows the provider has to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryScope {
    /// Only the final prompt token attends.
    #[default]
    LastToken,
    /// Every position from the start of the question onward.
    FromQuery,
}

/// One forward pass request.
#[derive(Debug, Clone, Copy)]
pub struct AttentionRequest<'a> {
    pub token_ids: &'a [u32],
    pub queries: QueryScope,
    pub layers: LayerScope,
    /// Heads the caller will read; providers may capture only these.
    pub heads: Option<&'a HeadSelection>,
}

/// Runs the causal model and returns its attention for one prompt.
///
/// Implementations must be safe to call from several threads at once when the
/// compressor is shared; the capture is returned by value and never buffered.
/// Providers may return more than requested (all layers, all query rows); the
/// extractor narrows it down.
pub trait AttentionProvider {
    fn run(&self, request: &AttentionRequest<'_>) -> Result<AttentionCapture, ModelError>;
}

impl<T: AttentionProvider + ?Sized> AttentionProvider for &T {
    fn run(&self, request: &AttentionRequest<'_>) -> Result<AttentionCapture, ModelError> {
        (**self).run(request)
    }
}

/// Maps sentence feature vectors to importance probabilities.
pub trait Classifier {
    /// One probability in `[0, 1]` per feature row.
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f32>, ModelError>;
}

/// Logistic-regression detector: `sigmoid(w · x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticDetector {
    pub weights: Vec<f32>,
    pub bias: f32,
}

impl LogisticDetector {
    pub fn new(weights: Vec<f32>, bias: f32) -> Self {
        Self { weights, bias }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let f = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(f)?)
    }
}

impl Classifier for LogisticDetector {
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f32>, ModelError> {
        if features.nrows() == 0 {
            return Ok(Vec::new());
        }
        if features.ncols() != self.weights.len() {
            return Err(ModelError::new(
                "logistic detector",
                format!(
                    "expected {} features per sentence, got {}",
                    self.weights.len(),
                    features.ncols()
                ),
            ));
        }

        let logits = features.dot(&ArrayView1::from(&self.weights[..])) + self.bias;
        Ok(logits.mapv(|logit| 1.0 / (1.0 + (-logit).exp())).to_vec())
    }
}
