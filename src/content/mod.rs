//! Content Source: headline text and generated debate lines.
//!
//! Both screens depend only on the [`ContentSource`] trait. The production
//! source combines a [`HeadlineStore`] with an LLM provider.

mod headlines;
mod llm_source;

use crate::debate::{candidate_arguments_or_default, CandidateArguments, Exchange};
use crate::llm::LlmError;
use crate::types::GenerationKnobs;
use async_trait::async_trait;

pub use headlines::{HeadlineStore, RestHeadlineStore, StaticHeadlines, DEFAULT_HEADLINE};
pub use llm_source::LlmContentSource;

/// Result type for content operations
pub type ContentResult<T> = Result<T, ContentError>;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Content source unavailable: {0}")]
    Unavailable(String),

    #[error("No headline for question {0}")]
    NotFound(String),

    #[error("Invalid content configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Literal headline text to tokenize for a question
    async fn headline_text(&self, question_id: &str) -> ContentResult<String>;

    /// One short sentence arguing against `topic`, conditioned on the history
    async fn opponent_argument(
        &self,
        topic: &str,
        history: &[Exchange],
        knobs: GenerationKnobs,
    ) -> ContentResult<String>;

    /// Unparsed reply to the request for three pro-topic sentences
    async fn candidate_arguments_raw(
        &self,
        topic: &str,
        knobs: GenerationKnobs,
    ) -> ContentResult<String>;

    /// Three pro-topic sentences; failures fall back to the built-in set
    async fn candidate_user_arguments(
        &self,
        topic: &str,
        knobs: GenerationKnobs,
    ) -> CandidateArguments {
        candidate_arguments_or_default(self.candidate_arguments_raw(topic, knobs).await)
    }
}
