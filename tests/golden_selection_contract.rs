use attention_compress::types::{
    CompressionMetadata, CompressionResult, CompressionTarget, ConfigFingerprint, PassageVersion,
    Sentence, TokenSpan,
};
use chrono::{DateTime, Utc};

// Serialized output is the public contract; field order follows struct
// definition order, so reordering fields breaks this test on purpose.

const EMPTY_SHA256: &str = "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

fn sample_result() -> CompressionResult {
    let started_at: DateTime<Utc> = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);

    CompressionResult {
        compressed_text: "Paris is the capital. ".to_string(),
        original_token_count: 8,
        compressed_token_count: 4,
        achieved_ratio: 0.5,
        sentence_scores: vec![0.75, 0.25],
        sentences: vec![
            Sentence {
                text: "Paris is the capital. ".to_string(),
                offset: 0,
                token_span: TokenSpan::new(0, 3),
                token_count: 4,
            },
            Sentence {
                text: "Bananas are yellow fruit.".to_string(),
                offset: 22,
                token_span: TokenSpan::new(4, 7),
                token_count: 4,
            },
        ],
        kept_indices: vec![0],
        metadata: CompressionMetadata {
            passage_version: PassageVersion::from_content(b""),
            config_fingerprint: ConfigFingerprint::from_canonical_json(b""),
            target: CompressionTarget::Tokens(4),
            resolved_budget: Some(4),
            forced_fallback: false,
            started_at,
            elapsed_ms: 12,
        },
    }
}

#[test]
fn golden_compression_result_serialization() {
    let result = sample_result();
    let json_str = serde_json::to_string_pretty(&result).unwrap();

    let text_pos = json_str.find("\"compressed_text\":").unwrap();
    let sentences_pos = json_str.find("\"sentences\":").unwrap();
    let metadata_pos = json_str.find("\"metadata\":").unwrap();
    assert!(text_pos < sentences_pos);
    assert!(sentences_pos < metadata_pos);

    let expected_json = format!(
        r#"{{
      "compressed_text": "Paris is the capital. ",
      "original_token_count": 8,
      "compressed_token_count": 4,
      "achieved_ratio": 0.5,
      "sentence_scores": [0.75, 0.25],
      "sentences": [
        {{
          "text": "Paris is the capital. ",
          "offset": 0,
          "token_span": {{ "first": 0, "last": 3 }},
          "token_count": 4
        }},
        {{
          "text": "Bananas are yellow fruit.",
          "offset": 22,
          "token_span": {{ "first": 4, "last": 7 }},
          "token_count": 4
        }}
      ],
      "kept_indices": [0],
      "metadata": {{
        "passage_version": "{EMPTY_SHA256}",
        "config_fingerprint": "{EMPTY_SHA256}",
        "target": {{ "kind": "tokens", "value": 4 }},
        "resolved_budget": 4,
        "forced_fallback": false,
        "started_at": "2026-01-01T00:00:00Z",
        "elapsed_ms": 12
      }}
    }}"#
    );

    // Normalize strings for comparison (remove all whitespace)
    let normalized_actual: String = json_str.chars().filter(|c| !c.is_whitespace()).collect();
    let normalized_expected: String = expected_json.chars().filter(|c| !c.is_whitespace()).collect();
    assert_eq!(normalized_actual, normalized_expected, "JSON structure mismatch against golden snapshot");

    let deserialized: CompressionResult = serde_json::from_str(&json_str).unwrap();
    assert_eq!(deserialized, result);
}

#[test]
fn golden_target_encodings() {
    let cases = [
        (CompressionTarget::Tokens(300), r#"{"kind":"tokens","value":300}"#),
        (CompressionTarget::Rate(0.5), r#"{"kind":"rate","value":0.5}"#),
        (CompressionTarget::Threshold(0.25), r#"{"kind":"threshold","value":0.25}"#),
    ];

    for (target, expected) in cases {
        assert_eq!(serde_json::to_string(&target).unwrap(), expected);
        let parsed: CompressionTarget = serde_json::from_str(expected).unwrap();
        assert_eq!(parsed, target);
    }
}

#[test]
fn version_is_a_tagged_content_hash() {
    assert_eq!(PassageVersion::from_content(b"").as_str(), EMPTY_SHA256);
    assert_ne!(
        PassageVersion::from_content(b"a passage"),
        PassageVersion::from_content(b"a passage.")
    );
}
