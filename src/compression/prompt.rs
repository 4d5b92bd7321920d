use serde::{Deserialize, Serialize};

use super::config::ConfigurationError;

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

const DEFAULT_TEMPLATE: &str = "Given the following information: {context}\nAnswer the following question based on the given information with one or few words: {question}\nAnswer:";

/// Prompt wording wrapped around the passage and question before the
/// attention model reads it. `{context}` must appear exactly once;
/// `{question}` is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptTemplate(String);

/// A rendered prompt plus where its parts landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub text: String,
    /// Byte offset of the passage in `text`.
    pub passage_start: usize,
    /// Byte offset of the first question insertion, if the template has one.
    pub question_start: Option<usize>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, ConfigurationError> {
        let template = Self(template.into());
        template.validate()?;
        Ok(template)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.0.matches(CONTEXT_SLOT).count() {
            1 => Ok(()),
            n => Err(ConfigurationError::InvalidTemplate(format!(
                "expected exactly one {CONTEXT_SLOT} slot, found {n}"
            ))),
        }
    }

    /// Fill the slots. The passage is inserted verbatim, so `{question}`
    /// appearing inside it is left alone.
    pub fn render(&self, passage: &str, question: &str) -> Result<RenderedPrompt, ConfigurationError> {
        let (prefix, suffix) = self.0.split_once(CONTEXT_SLOT).ok_or_else(|| {
            ConfigurationError::InvalidTemplate(format!("missing {CONTEXT_SLOT} slot"))
        })?;

        let prefix_question = prefix.find(QUESTION_SLOT);
        let suffix_question = suffix.find(QUESTION_SLOT);

        let prefix = prefix.replace(QUESTION_SLOT, question);
        let passage_start = prefix.len();
        let suffix_start = passage_start + passage.len();

        let question_start = match (prefix_question, suffix_question) {
            (Some(pos), _) => Some(pos),
            (None, Some(pos)) => Some(suffix_start + pos),
            (None, None) => None,
        };

        let mut text = prefix;
        text.push_str(passage);
        text.push_str(&suffix.replace(QUESTION_SLOT, question));

        Ok(RenderedPrompt {
            text,
            passage_start,
            question_start,
        })
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self(DEFAULT_TEMPLATE.to_string())
    }
}
