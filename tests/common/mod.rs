#![allow(dead_code)]

use std::collections::HashSet;

use ndarray::Array5;

use attention_compress::attention::{
    AttentionCapture, AttentionProvider, AttentionRequest, AttentionTensor, Classifier,
    FeatureMatrix, HeadAttention,
};
use attention_compress::segmentation::{BoundaryDetector, Language};
use attention_compress::tokenize::{Encoding, OffsetTokenizer, TokenCounter};
use attention_compress::types::{ModelError, TokenOffsets};

/// Stable id for a word: FNV-1a over its lowercased alphanumeric chars.
pub fn word_id(word: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for c in word.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase) {
        let mut buf = [0u8; 4];
        for b in c.encode_utf8(&mut buf).bytes() {
            hash ^= u32::from(b);
            hash = hash.wrapping_mul(0x0100_0193);
        }
    }
    // 0 is reserved for the BOS token
    hash.max(1)
}

/// One token per whitespace-delimited word, preceded by a zero-width BOS token.
pub struct WordTokenizer;

impl OffsetTokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Result<Encoding, ModelError> {
        let mut ids = vec![0];
        let mut offsets = vec![(0, 0)];

        let mut start = None;
        for (i, c) in text.char_indices() {
            if c.is_whitespace() {
                if let Some(s) = start.take() {
                    ids.push(word_id(&text[s..i]));
                    offsets.push((s, i));
                }
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            ids.push(word_id(&text[s..]));
            offsets.push((s, text.len()));
        }

        Ok(Encoding::new(ids, TokenOffsets::new(offsets)))
    }
}

/// Counts whitespace-delimited words.
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count_tokens(&self, content: &str) -> usize {
        content.split_whitespace().count()
    }
}

/// Causal attention that puts extra weight on a fixed set of words.
///
/// Head `h` weights hot keys `hot_weight * (h + 1)` and everything else 1.0;
/// a query never attends to keys after itself.
pub struct ScriptedProvider {
    pub layers: usize,
    pub heads: usize,
    pub hot: HashSet<u32>,
    pub hot_weight: f32,
    pub last_query_only: bool,
}

impl ScriptedProvider {
    pub fn favoring(words: &[&str]) -> Self {
        Self {
            layers: 2,
            heads: 2,
            hot: words.iter().map(|w| word_id(w)).collect(),
            hot_weight: 8.0,
            last_query_only: false,
        }
    }

    pub fn last_query_only(mut self) -> Self {
        self.last_query_only = true;
        self
    }

    pub fn weight(&self, head: usize, query: usize, key: usize, ids: &[u32]) -> f32 {
        if key > query {
            0.0
        } else if self.hot.contains(&ids[key]) {
            self.hot_weight * (head + 1) as f32
        } else {
            1.0
        }
    }
}

impl AttentionProvider for ScriptedProvider {
    fn run(&self, request: &AttentionRequest<'_>) -> Result<AttentionCapture, ModelError> {
        let ids = request.token_ids;
        let n = ids.len();
        let queries: Vec<usize> = if self.last_query_only {
            vec![n - 1]
        } else {
            (0..n).collect()
        };

        let weights = Array5::from_shape_fn(
            (self.layers, 1, self.heads, queries.len(), n),
            |(_, _, h, q, k)| self.weight(h, queries[q], k, ids),
        );

        let tensor = AttentionTensor::from_array(weights)
            .map_err(|e| ModelError::new("scripted provider", e.to_string()))?;
        Ok(AttentionCapture::Layers(tensor))
    }
}

/// Captures individual heads of a [`ScriptedProvider`] at the final query.
pub struct HeadTapProvider {
    pub inner: ScriptedProvider,
    pub taps: Vec<(usize, usize)>,
}

impl AttentionProvider for HeadTapProvider {
    fn run(&self, request: &AttentionRequest<'_>) -> Result<AttentionCapture, ModelError> {
        let ids = request.token_ids;
        let last = ids.len() - 1;
        let heads = self
            .taps
            .iter()
            .map(|&(layer, head)| HeadAttention {
                layer,
                head,
                weights: (0..ids.len()).map(|k| self.inner.weight(head, last, k, ids)).collect(),
            })
            .collect();
        Ok(AttentionCapture::Heads(heads))
    }
}

/// Always fails, to prove a call never reached the model.
pub struct UnreachableProvider;

impl AttentionProvider for UnreachableProvider {
    fn run(&self, _request: &AttentionRequest<'_>) -> Result<AttentionCapture, ModelError> {
        Err(ModelError::new("unreachable provider", "model must not be invoked"))
    }
}

/// Returns fixed probabilities regardless of features.
pub struct ScriptedClassifier(pub Vec<f32>);

impl Classifier for ScriptedClassifier {
    fn predict_proba(&self, _features: &FeatureMatrix) -> Result<Vec<f32>, ModelError> {
        Ok(self.0.clone())
    }
}

/// Returns fragments verbatim, whatever the passage says.
pub struct FixedDetector(pub Vec<String>);

impl FixedDetector {
    pub fn new(fragments: &[&str]) -> Self {
        Self(fragments.iter().map(|f| f.to_string()).collect())
    }
}

impl BoundaryDetector for FixedDetector {
    fn split(&self, _text: &str, _language: Language) -> Result<Vec<String>, ModelError> {
        Ok(self.0.clone())
    }
}
