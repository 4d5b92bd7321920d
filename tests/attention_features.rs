mod common;

use attention_compress::attention::{
    attention_ratios, score_sentences, AttentionCapture, AttentionTensor, ExtractionError,
    ExtractionPlan, HeadAttention, HeadSelection, LayerScope, LogisticDetector, QueryWindow,
    Scoring,
};
use attention_compress::types::{CompressionError, Sentence, TokenSpan};
use common::ScriptedClassifier;
use ndarray::{array, s, Array2, Axis};

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn sentence(first: usize, last: usize) -> Sentence {
    Sentence {
        text: format!("tokens {first} to {last}"),
        offset: 0,
        token_span: TokenSpan::new(first, last),
        token_count: last - first + 1,
    }
}

/// One layer, two heads, one query, five keys.
fn single_query_capture() -> AttentionCapture {
    let tensor = AttentionTensor::from_nested(vec![vec![
        vec![vec![9.0, 1.0, 1.0, 2.0, 4.0]],
        vec![vec![5.0, 0.0, 0.0, 0.0, 0.0]],
    ]])
    .unwrap();
    AttentionCapture::Layers(tensor)
}

#[test]
fn ratio_columns_sum_to_one_over_the_passage() {
    let ratios = attention_ratios(
        &single_query_capture(),
        TokenSpan::new(1, 4),
        LayerScope::All,
        QueryWindow::Last,
        None,
    )
    .unwrap();

    assert_eq!(ratios.dim(), (4, 2));

    let mass = ratios.sum_axis(Axis(0));
    assert_close(mass[0], 1.0);
    assert_close(ratios[[3, 0]], 0.5);

    // no mass on the passage at all: the column stays zero
    assert!(ratios.slice(s![.., 1]).iter().all(|r| *r == 0.0));
}

#[test]
fn query_window_averages_before_normalizing() {
    let tensor = AttentionTensor::from_nested(vec![vec![vec![
        vec![1.0, 0.0, 0.0],
        vec![1.0, 1.0, 2.0],
    ]]])
    .unwrap();
    let capture = AttentionCapture::Layers(tensor);
    let keys = TokenSpan::new(0, 2);

    let last = attention_ratios(&capture, keys, LayerScope::All, QueryWindow::Last, None).unwrap();
    assert_eq!(last.column(0), array![0.25f32, 0.25, 0.5]);

    let all = attention_ratios(&capture, keys, LayerScope::All, QueryWindow::From(0), None).unwrap();
    assert_close(all[[0, 0]], 0.4);
    assert_close(all[[1, 0]], 0.2);
    assert_close(all[[2, 0]], 0.4);

    let err = attention_ratios(&capture, keys, LayerScope::All, QueryWindow::From(2), None)
        .unwrap_err();
    assert_eq!(err, ExtractionError::QueryStartOutOfBounds { start: 2, available: 2 });
}

fn two_layer_capture() -> AttentionCapture {
    // layer l, head h puts all of its mass on key l * 2 + h
    let nested: Vec<Vec<Vec<Vec<f32>>>> = (0..2)
        .map(|l| {
            (0..2)
                .map(|h| {
                    let mut row = vec![0.0; 4];
                    row[l * 2 + h] = 1.0;
                    vec![row]
                })
                .collect()
        })
        .collect();
    AttentionCapture::Layers(AttentionTensor::from_nested(nested).unwrap())
}

#[test]
fn columns_are_layer_major_and_respect_scope() {
    let keys = TokenSpan::new(0, 3);
    let capture = two_layer_capture();

    let all = attention_ratios(&capture, keys, LayerScope::All, QueryWindow::Last, None).unwrap();
    assert_eq!(all, Array2::<f32>::eye(4));

    let last = attention_ratios(&capture, keys, LayerScope::LastOnly, QueryWindow::Last, None)
        .unwrap();
    assert_eq!(last.ncols(), 2);
    assert_eq!(last[[2, 0]], 1.0);
    assert_eq!(last[[3, 1]], 1.0);
}

#[test]
fn head_selection_narrows_columns() {
    let keys = TokenSpan::new(0, 3);
    let capture = two_layer_capture();

    let selection: HeadSelection = [(1, 0), (0, 1)].into_iter().collect();
    let ratios = attention_ratios(&capture, keys, LayerScope::All, QueryWindow::Last, Some(&selection))
        .unwrap();
    assert_eq!(ratios.ncols(), 2);
    assert_eq!(ratios[[1, 0]], 1.0);
    assert_eq!(ratios[[2, 1]], 1.0);

    let unmatched: HeadSelection = [(7, 7)].into_iter().collect();
    let err = attention_ratios(&capture, keys, LayerScope::All, QueryWindow::Last, Some(&unmatched))
        .unwrap_err();
    assert_eq!(err, ExtractionError::NoMatchingHeads);
}

#[test]
fn captured_heads_are_ordered_and_need_the_last_query() {
    let capture = AttentionCapture::Heads(vec![
        HeadAttention { layer: 3, head: 1, weights: vec![0.0, 0.0, 2.0] },
        HeadAttention { layer: 1, head: 4, weights: vec![0.0, 3.0, 1.0] },
    ]);
    let keys = TokenSpan::new(1, 2);

    let ratios = attention_ratios(&capture, keys, LayerScope::All, QueryWindow::Last, None).unwrap();
    assert_eq!(ratios, array![[0.75f32, 0.0], [0.25, 1.0]]);

    let last = attention_ratios(&capture, keys, LayerScope::LastOnly, QueryWindow::Last, None)
        .unwrap();
    assert_eq!(last.ncols(), 1);

    let err = attention_ratios(&capture, keys, LayerScope::All, QueryWindow::From(0), None)
        .unwrap_err();
    assert_eq!(err, ExtractionError::QueryAxisMissing);

    let empty = AttentionCapture::Heads(Vec::new());
    let err = attention_ratios(&empty, keys, LayerScope::All, QueryWindow::Last, None).unwrap_err();
    assert_eq!(err, ExtractionError::EmptyCapture);
}

#[test]
fn keys_beyond_the_capture_fail() {
    let err = attention_ratios(
        &single_query_capture(),
        TokenSpan::new(2, 9),
        LayerScope::All,
        QueryWindow::Last,
        None,
    )
    .unwrap_err();
    assert_eq!(err, ExtractionError::KeyRangeOutOfBounds { last: 9, available: 5 });
}

fn plan() -> ExtractionPlan<'static> {
    ExtractionPlan {
        passage: TokenSpan::new(1, 4),
        layers: LayerScope::All,
        window: QueryWindow::Last,
        heads: None,
    }
}

#[test]
fn raw_scores_are_rescaled_to_unit_range() {
    let sentences = vec![sentence(0, 1), sentence(2, 2), sentence(3, 3)];
    let scores = score_sentences(&single_query_capture(), &plan(), &sentences, Scoring::Raw).unwrap();

    // head 0 ratios are [1/8, 1/8, 2/8, 4/8], head 1 contributes zeros
    assert_eq!(scores.len(), 3);
    assert_close(scores[0], 0.0);
    assert_close(scores[1], 1.0 / 3.0);
    assert_close(scores[2], 1.0);
}

#[test]
fn scoring_is_deterministic() {
    let sentences = vec![sentence(0, 1), sentence(2, 3)];
    let capture = single_query_capture();

    let first = score_sentences(&capture, &plan(), &sentences, Scoring::Raw).unwrap();
    let second = score_sentences(&capture, &plan(), &sentences, Scoring::Raw).unwrap();
    assert_eq!(first, second);
}

#[test]
fn classifier_receives_one_row_per_sentence() {
    let sentences = vec![sentence(0, 1), sentence(2, 3)];
    let detector = LogisticDetector::new(vec![0.0, 0.0], 0.0);

    let scores = score_sentences(
        &single_query_capture(),
        &plan(),
        &sentences,
        Scoring::Classifier(&detector),
    )
    .unwrap();
    assert_eq!(scores, vec![0.5, 0.5]);
}

#[test]
fn classifier_output_length_is_checked() {
    let sentences = vec![sentence(0, 1), sentence(2, 3)];
    let classifier = ScriptedClassifier(vec![0.9]);

    let err = score_sentences(
        &single_query_capture(),
        &plan(),
        &sentences,
        Scoring::Classifier(&classifier),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CompressionError::Extraction(ExtractionError::ClassifierOutput { expected: 2, actual: 1 })
    ));
}

#[test]
fn classifier_width_mismatch_surfaces_as_model_error() {
    let sentences = vec![sentence(0, 1)];
    let detector = LogisticDetector::new(vec![1.0; 5], 0.0);

    let err = score_sentences(
        &single_query_capture(),
        &plan(),
        &sentences,
        Scoring::Classifier(&detector),
    )
    .unwrap_err();
    assert!(matches!(err, CompressionError::Model(_)));
}
