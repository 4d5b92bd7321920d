use ndarray::{s, Axis};

use super::{ExtractionError, FeatureMatrix, RatioMatrix};
use crate::types::TokenSpan;

/// Per-sentence mean of the ratio rows covered by each span.
///
/// Spans are relative to the passage's first token. NaN entries are skipped
/// when averaging; a column with no finite entry averages to 0.0.
pub fn sentence_features(
    ratios: &RatioMatrix,
    spans: &[TokenSpan],
) -> Result<FeatureMatrix, ExtractionError> {
    let mut features = FeatureMatrix::zeros((spans.len(), ratios.ncols()));

    for (span, mut out) in spans.iter().zip(features.rows_mut()) {
        if span.last >= ratios.nrows() {
            return Err(ExtractionError::KeyRangeOutOfBounds {
                last: span.last,
                available: ratios.nrows(),
            });
        }

        let covered = ratios.slice(s![span.first..span.last + 1, ..]);
        out.assign(&covered.map_axis(Axis(0), |column| nan_mean(column.iter().copied())));
    }

    Ok(features)
}

/// One raw importance score per sentence: the mean of its feature vector,
/// min-max rescaled over the sentence set.
pub fn raw_scores(features: &FeatureMatrix) -> Vec<f32> {
    let mut scores = features
        .map_axis(Axis(1), |row| nan_mean(row.iter().copied()))
        .to_vec();
    min_max_normalize(&mut scores);
    scores
}

/// Rescale into `[0, 1]`. Leaves the scores untouched when they are all equal.
pub fn min_max_normalize(scores: &mut [f32]) {
    let (min, max) = scores
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), s| (lo.min(*s), hi.max(*s)));

    let range = max - min;
    if range > 0.0 {
        for score in scores.iter_mut() {
            *score = (*score - min) / range;
        }
    }
}

fn nan_mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, n) = values
        .filter(|v| !v.is_nan())
        .fold((0.0f32, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f32
    }
}
