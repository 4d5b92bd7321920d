use ndarray::{s, stack, Array1, ArrayView1, ArrayViewMut1, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tensor::{AttentionCapture, AttentionTensor, HeadAttention, HeadSelection};
use super::{ExtractionError, RatioMatrix};
use crate::types::TokenSpan;

/// Floor for a head's attention mass over the passage before dividing by it.
pub const MIN_ATTENTION_MASS: f32 = 1e-8;

/// Which layers contribute features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerScope {
    #[default]
    All,
    LastOnly,
}

/// Which query positions contribute, resolved against a concrete prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryWindow {
    /// Only the final prompt token.
    Last,
    /// Mean over every position from this index to the end of the prompt.
    From(usize),
}

/// L1-normalized attention over the passage keys.
///
/// Every selected head×layer combination contributes one column (layer-major,
/// then head); each column is that head's attention restricted to `keys`,
/// divided by its total over the same range. The denominator is floored at
/// [`MIN_ATTENTION_MASS`], and any NaN left after the division becomes 0.0,
/// so an all-zero or NaN-poisoned head yields a zero column instead of an
/// error.
pub fn attention_ratios(
    capture: &AttentionCapture,
    keys: TokenSpan,
    layers: LayerScope,
    window: QueryWindow,
    heads: Option<&HeadSelection>,
) -> Result<RatioMatrix, ExtractionError> {
    let columns = match capture {
        AttentionCapture::Layers(tensor) => tensor_columns(tensor, keys, layers, window, heads)?,
        AttentionCapture::Heads(captured) => captured_columns(captured, keys, layers, window, heads)?,
    };

    debug!(
        combinations = columns.len(),
        keys = keys.token_len(),
        "collected head attention over passage"
    );

    let views: Vec<ArrayView1<'_, f32>> = columns.iter().map(|column| column.view()).collect();
    let mut ratios = stack(Axis(1), &views).map_err(|_| ExtractionError::ShapeMismatch {
        expected: keys.token_len() * columns.len(),
        actual: columns.iter().map(|column| column.len()).sum(),
    })?;
    for column in ratios.columns_mut() {
        normalize_column(column);
    }

    Ok(ratios)
}

fn normalize_column(mut column: ArrayViewMut1<'_, f32>) {
    let mass = column.sum();
    // `mass < floor` is false for NaN, so NaN mass propagates and is zeroed below.
    let denominator = if mass < MIN_ATTENTION_MASS {
        MIN_ATTENTION_MASS
    } else {
        mass
    };
    column.mapv_inplace(|weight| {
        let ratio = weight / denominator;
        if ratio.is_nan() {
            0.0
        } else {
            ratio
        }
    });
}

fn tensor_columns(
    tensor: &AttentionTensor,
    keys: TokenSpan,
    layers: LayerScope,
    window: QueryWindow,
    heads: Option<&HeadSelection>,
) -> Result<Vec<Array1<f32>>, ExtractionError> {
    let shape = tensor.shape();
    if shape.layers == 0 || shape.heads == 0 || shape.queries == 0 {
        return Err(ExtractionError::EmptyCapture);
    }
    if keys.last >= shape.keys {
        return Err(ExtractionError::KeyRangeOutOfBounds {
            last: keys.last,
            available: shape.keys,
        });
    }

    let queries = match window {
        QueryWindow::Last => shape.queries - 1..shape.queries,
        QueryWindow::From(start) if start < shape.queries => start..shape.queries,
        QueryWindow::From(start) => {
            return Err(ExtractionError::QueryStartOutOfBounds {
                start,
                available: shape.queries,
            })
        }
    };

    let layer_range = match layers {
        LayerScope::All => 0..shape.layers,
        LayerScope::LastOnly => shape.layers - 1..shape.layers,
    };

    let mut columns = Vec::new();
    for layer in layer_range {
        for head in 0..shape.heads {
            if heads.is_some_and(|selection| !selection.contains(layer, head)) {
                continue;
            }

            let window_weights = tensor
                .head(layer, head)
                .slice_move(s![queries.clone(), keys.first..keys.last + 1]);
            let mean = window_weights
                .mean_axis(Axis(0))
                .ok_or(ExtractionError::EmptyCapture)?;
            columns.push(mean);
        }
    }

    if columns.is_empty() {
        return Err(ExtractionError::NoMatchingHeads);
    }
    Ok(columns)
}

fn captured_columns(
    captured: &[HeadAttention],
    keys: TokenSpan,
    layers: LayerScope,
    window: QueryWindow,
    heads: Option<&HeadSelection>,
) -> Result<Vec<Array1<f32>>, ExtractionError> {
    if captured.is_empty() {
        return Err(ExtractionError::EmptyCapture);
    }
    if let QueryWindow::From(_) = window {
        return Err(ExtractionError::QueryAxisMissing);
    }

    let last_layer = captured.iter().map(|c| c.layer).max().unwrap_or(0);

    let mut selected: Vec<&HeadAttention> = captured
        .iter()
        .filter(|c| layers == LayerScope::All || c.layer == last_layer)
        .filter(|c| heads.map_or(true, |selection| selection.contains(c.layer, c.head)))
        .collect();
    selected.sort_by_key(|c| (c.layer, c.head));

    if selected.is_empty() {
        return Err(ExtractionError::NoMatchingHeads);
    }

    selected
        .into_iter()
        .map(|c| {
            c.weights
                .get(keys.first..=keys.last)
                .map(|weights| Array1::from(weights.to_vec()))
                .ok_or(ExtractionError::KeyRangeOutOfBounds {
                    last: keys.last,
                    available: c.weights.len(),
                })
        })
        .collect()
}
