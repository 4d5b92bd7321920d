use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use ndarray::{s, Array5, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::ExtractionError;
use crate::compression::ConfigurationError;

/// Axis lengths of an attention tensor, in `(layer, batch, head, query, key)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionShape {
    pub layers: usize,
    pub batch: usize,
    pub heads: usize,
    pub queries: usize,
    pub keys: usize,
}

impl AttentionShape {
    pub fn volume(&self) -> usize {
        self.layers * self.batch * self.heads * self.queries * self.keys
    }
}

/// Stacked per-layer attention weights for a single prompt, indexed
/// `[layer, batch, head, query, key]`.
///
/// The query axis holds either every prompt position or only the last one,
/// depending on what the provider captured.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionTensor {
    weights: Array5<f32>,
}

impl AttentionTensor {
    /// Wrap a flat row-major buffer. Only batch size 1 is accepted.
    pub fn new(shape: AttentionShape, data: Vec<f32>) -> Result<Self, ExtractionError> {
        let actual = data.len();
        let weights = Array5::from_shape_vec(
            (shape.layers, shape.batch, shape.heads, shape.queries, shape.keys),
            data,
        )
        .map_err(|_| ExtractionError::ShapeMismatch {
            expected: shape.volume(),
            actual,
        })?;
        Self::from_array(weights)
    }

    /// Take ownership of an already stacked array. Only batch size 1 is accepted.
    pub fn from_array(weights: Array5<f32>) -> Result<Self, ExtractionError> {
        let batch = weights.len_of(Axis(1));
        if batch != 1 {
            return Err(ExtractionError::UnsupportedBatch(batch));
        }
        Ok(Self { weights })
    }

    /// Build from nested `[layer][head][query][key]` weights (batch of one).
    pub fn from_nested(weights: Vec<Vec<Vec<Vec<f32>>>>) -> Result<Self, ExtractionError> {
        let layers = weights.len();
        let heads = weights.first().map_or(0, Vec::len);
        let queries = weights
            .first()
            .and_then(|l| l.first())
            .map_or(0, Vec::len);
        let keys = weights
            .first()
            .and_then(|l| l.first())
            .and_then(|h| h.first())
            .map_or(0, Vec::len);

        let shape = AttentionShape {
            layers,
            batch: 1,
            heads,
            queries,
            keys,
        };

        let rectangular = weights.iter().all(|l| {
            l.len() == heads
                && l.iter().all(|h| {
                    h.len() == queries && h.iter().all(|q| q.len() == keys)
                })
        });

        let data: Vec<f32> = weights.into_iter().flatten().flatten().flatten().collect();
        if !rectangular {
            return Err(ExtractionError::ShapeMismatch {
                expected: shape.volume(),
                actual: data.len(),
            });
        }
        Self::new(shape, data)
    }

    pub fn shape(&self) -> AttentionShape {
        let (layers, batch, heads, queries, keys) = self.weights.dim();
        AttentionShape {
            layers,
            batch,
            heads,
            queries,
            keys,
        }
    }

    /// `[query, key]` weights of one `(layer, head)`.
    pub fn head(&self, layer: usize, head: usize) -> ArrayView2<'_, f32> {
        self.weights.slice(s![layer, 0, head, .., ..])
    }

    /// Weights over every key position for one `(layer, head, query)`.
    pub fn row(&self, layer: usize, head: usize, query: usize) -> ArrayView1<'_, f32> {
        self.weights.slice(s![layer, 0, head, query, ..])
    }
}

/// Final-query attention of one head, over every key position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadAttention {
    pub layer: usize,
    pub head: usize,
    pub weights: Vec<f32>,
}

/// What an attention provider hands back for one forward pass.
///
/// Owned by the caller for the duration of one compression call; nothing is
/// buffered between calls.
#[derive(Debug, Clone, PartialEq)]
pub enum AttentionCapture {
    /// Full stacked tensor.
    Layers(AttentionTensor),
    /// Individually captured heads, in any order.
    Heads(Vec<HeadAttention>),
}

/// Layer → head indices whose attention feeds the features.
///
/// Serialized as a JSON object with stringified layer keys, e.g.
/// `{"3": [0, 5], "12": [7]}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadSelection {
    layers: BTreeMap<usize, BTreeSet<usize>>,
}

impl HeadSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, layer: usize, head: usize) {
        self.layers.entry(layer).or_default().insert(head);
    }

    pub fn contains(&self, layer: usize, head: usize) -> bool {
        self.layers
            .get(&layer)
            .is_some_and(|heads| heads.contains(&head))
    }

    /// True when no head is selected in any layer.
    pub fn is_empty(&self) -> bool {
        self.layers.values().all(BTreeSet::is_empty)
    }

    /// Selected `(layer, head)` pairs, layer-major.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.layers
            .iter()
            .flat_map(|(layer, heads)| heads.iter().map(move |head| (*layer, *head)))
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let f = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(f)?)
    }
}

impl FromIterator<(usize, usize)> for HeadSelection {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        let mut selection = HeadSelection::new();
        for (layer, head) in iter {
            selection.insert(layer, head);
        }
        selection
    }
}
