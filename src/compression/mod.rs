//! One-call orchestration: render, align, segment, score, select.

pub mod config;
pub mod prompt;

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::alignment::locate_from;
use crate::attention::{
    score_sentences, AttentionProvider, AttentionRequest, Classifier, ExtractionPlan, QueryScope,
    QueryWindow, Scoring, ScoringMode,
};
use crate::segmentation::{
    BoundaryDetector, Language, PassageLayout, RuleBoundaryDetector, SentenceSegmenter,
};
use crate::selection::{rank_by_score, select, SelectionTarget};
use crate::tokenize::{OffsetTokenizer, TokenCounter};
use crate::types::{
    zip_scores, CompressionError, CompressionMetadata, CompressionResult, CompressionTarget,
    ConfigFingerprint, PassageVersion, ScoredSentence, SelectionResult, TokenOffsets, TokenSpan,
};
pub use config::{CompressorConfig, ConfigurationError};
pub use prompt::{PromptTemplate, RenderedPrompt};

/// Longest sentence excerpt written to the score report.
const REPORT_PREVIEW_CHARS: usize = 100;

pub type SharedClassifier = Box<dyn Classifier + Send + Sync>;
pub type SharedDetector = Box<dyn BoundaryDetector + Send + Sync>;

/// Attention-guided passage compressor.
///
/// Holds only immutable collaborators, so one instance can serve concurrent
/// calls as long as the collaborators themselves are `Sync`. Each call owns
/// its prompt, capture and sentences; nothing carries over between calls.
pub struct Compressor<T, A, C> {
    config: CompressorConfig,
    fingerprint: ConfigFingerprint,
    tokenizer: T,
    provider: A,
    counter: C,
    classifier: Option<SharedClassifier>,
    segmenter: SentenceSegmenter<SharedDetector>,
}

/// Serializable description of a compressor's active setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressorSummary {
    pub config: CompressorConfig,
    pub config_fingerprint: ConfigFingerprint,
    pub has_classifier: bool,
}

impl<T, A, C> Compressor<T, A, C>
where
    T: OffsetTokenizer,
    A: AttentionProvider,
    C: TokenCounter,
{
    /// Validate `config` against the supplied collaborators.
    ///
    /// All configuration errors surface here, before any inference runs.
    pub fn new(
        config: CompressorConfig,
        tokenizer: T,
        provider: A,
        counter: C,
        classifier: Option<SharedClassifier>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        if config.scoring == ScoringMode::Classifier && classifier.is_none() {
            return Err(ConfigurationError::MissingClassifier);
        }

        let fingerprint = config.fingerprint()?;
        let segmenter = SentenceSegmenter::new(
            Box::new(RuleBoundaryDetector) as SharedDetector,
            config.min_word_length,
        );

        debug!(
            scoring = ?config.scoring,
            layers = ?config.layers,
            queries = ?config.queries,
            selected_heads = ?config.head_selection.as_ref().map(|h| h.pairs().count()),
            min_word_length = config.min_word_length,
            fingerprint = fingerprint.as_str(),
            "compressor configured"
        );

        Ok(Self {
            config,
            fingerprint,
            tokenizer,
            provider,
            counter,
            classifier,
            segmenter,
        })
    }

    /// Replace the built-in punctuation rules with another boundary detector.
    pub fn with_detector(mut self, detector: impl BoundaryDetector + Send + Sync + 'static) -> Self {
        self.segmenter =
            SentenceSegmenter::new(Box::new(detector) as SharedDetector, self.config.min_word_length);
        self
    }

    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    pub fn describe(&self) -> CompressorSummary {
        CompressorSummary {
            config: self.config.clone(),
            config_fingerprint: self.fingerprint.clone(),
            has_classifier: self.classifier.is_some(),
        }
    }

    /// Compress with the configured default target.
    pub fn compress_default(
        &self,
        passage: &str,
        query: &str,
        language: Language,
    ) -> Result<CompressionResult, CompressionError> {
        self.compress(passage, query, language, self.config.default_target)
    }

    pub fn compress(
        &self,
        passage: &str,
        query: &str,
        language: Language,
        target: CompressionTarget,
    ) -> Result<CompressionResult, CompressionError> {
        let started_at = Utc::now();
        let timer = Instant::now();

        config::validate_target(target)?;
        let scoring = self.scoring()?;
        let passage_version = PassageVersion::from_content(passage.as_bytes());

        if passage.trim().is_empty() {
            return Ok(self.empty_result(passage_version, target, started_at, timer));
        }

        let rendered = self.config.prompt_template.render(passage, query)?;
        let encoding = self.tokenizer.tokenize(&rendered.text)?;

        let passage_tokens =
            locate_from(&encoding.offsets, &rendered.text, passage, rendered.passage_start)?;

        let layout = PassageLayout {
            offsets: &encoding.offsets,
            char_start: rendered.passage_start,
            tokens: passage_tokens,
        };
        let sentences = self.segmenter.segment(passage, language, &layout, &self.counter)?;
        if sentences.is_empty() {
            debug!("no sentence survived segmentation");
            return Ok(self.empty_result(passage_version, target, started_at, timer));
        }

        let window = match self.config.queries {
            QueryScope::LastToken => QueryWindow::Last,
            QueryScope::FromQuery => {
                QueryWindow::From(self.query_start(&rendered, &encoding.offsets, query, passage_tokens)?)
            }
        };

        let capture = self.provider.run(&AttentionRequest {
            token_ids: &encoding.ids,
            queries: self.config.queries,
            layers: self.config.layers,
            heads: self.config.head_selection.as_ref(),
        })?;

        let plan = ExtractionPlan {
            passage: passage_tokens,
            layers: self.config.layers,
            window,
            heads: self.config.head_selection.as_ref(),
        };
        let scores = score_sentences(&capture, &plan, &sentences, scoring)?;

        let scored = zip_scores(&sentences, &scores);
        let total_tokens: usize = scored.iter().map(ScoredSentence::token_count).sum();
        let selection_target = SelectionTarget::resolve(target, total_tokens);
        let selection = select(&scored, selection_target);

        if self.config.report_sentence_scores {
            report_selection(&scored, &selection);
        }

        let compressed_token_count = self.counter.count_tokens(&selection.compressed_text);

        Ok(CompressionResult {
            compressed_text: selection.compressed_text,
            original_token_count: total_tokens,
            compressed_token_count,
            achieved_ratio: selection.achieved_ratio,
            sentence_scores: scores,
            kept_indices: selection.kept_indices,
            metadata: CompressionMetadata {
                passage_version,
                config_fingerprint: self.fingerprint.clone(),
                target,
                resolved_budget: selection_target.budget(),
                forced_fallback: selection.forced,
                started_at,
                elapsed_ms: elapsed_ms(timer),
            },
            sentences,
        })
    }

    fn scoring(&self) -> Result<Scoring<'_>, ConfigurationError> {
        match self.config.scoring {
            ScoringMode::Raw => Ok(Scoring::Raw),
            ScoringMode::Classifier => {
                let classifier = self
                    .classifier
                    .as_deref()
                    .ok_or(ConfigurationError::MissingClassifier)?;
                Ok(Scoring::Classifier(classifier))
            }
        }
    }

    /// First token of the question, or the token after the passage when
    /// there is no question to find. That fallback is capped at the final
    /// prompt token, since the passage may close the prompt.
    fn query_start(
        &self,
        rendered: &RenderedPrompt,
        offsets: &TokenOffsets,
        query: &str,
        passage_tokens: TokenSpan,
    ) -> Result<usize, CompressionError> {
        match rendered.question_start {
            Some(from) if !query.is_empty() => {
                Ok(locate_from(offsets, &rendered.text, query, from)?.first)
            }
            _ => Ok((passage_tokens.last + 1).min(offsets.len().saturating_sub(1))),
        }
    }

    fn empty_result(
        &self,
        passage_version: PassageVersion,
        target: CompressionTarget,
        started_at: DateTime<Utc>,
        timer: Instant,
    ) -> CompressionResult {
        let selection = SelectionResult::empty();
        CompressionResult {
            compressed_token_count: self.counter.count_tokens(&selection.compressed_text),
            compressed_text: selection.compressed_text,
            original_token_count: 0,
            achieved_ratio: selection.achieved_ratio,
            sentence_scores: Vec::new(),
            sentences: Vec::new(),
            kept_indices: selection.kept_indices,
            metadata: CompressionMetadata {
                passage_version,
                config_fingerprint: self.fingerprint.clone(),
                target,
                resolved_budget: SelectionTarget::resolve(target, 0).budget(),
                forced_fallback: false,
                started_at,
                elapsed_ms: elapsed_ms(timer),
            },
        }
    }
}

fn elapsed_ms(timer: Instant) -> u64 {
    u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Log kept sentences ranked by score, highest first.
fn report_selection(scored: &[ScoredSentence<'_>], selection: &SelectionResult) {
    info!(
        selected = selection.kept_indices.len(),
        considered = scored.len(),
        kept_tokens = selection.kept_tokens,
        total_tokens = selection.total_tokens,
        forced = selection.forced,
        "sentence selection"
    );

    let ranked = rank_by_score(scored)
        .into_iter()
        .filter(|i| selection.kept_indices.binary_search(i).is_ok());
    for (rank, index) in ranked.enumerate() {
        let sentence = &scored[index];
        info!(
            rank = rank + 1,
            index,
            score = %format!("{:.3}", sentence.score),
            tokens = sentence.token_count(),
            text = %preview(sentence.text().trim()),
            "kept sentence"
        );
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= REPORT_PREVIEW_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(REPORT_PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}
