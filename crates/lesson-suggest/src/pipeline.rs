//! The suggestion pipeline: prompt, request, parse, fallback.

use std::time::Duration;

use tracing::{info, warn};

use crate::client::{ChatRequest, HttpTextGenerator, TextGenerator};
use crate::{
    fallback, parse, prompt, FallbackReason, SuggestError, SuggestionContext, SuggestionOutcome,
};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 6;

/// Default (and maximum useful) number of suggestions.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

/// Tuning for a [`SuggestionPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Applied to every request, including the first attempt.
    pub timeout: Duration,
    /// Upper bound on returned suggestions.
    pub max_suggestions: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

/// Fetches suggestions and guarantees a non-empty result.
///
/// There is no automatic retry: a failure is answered with fallback content
/// and the learner may ask again manually.
#[derive(Debug, Clone)]
pub struct SuggestionPipeline<G> {
    generator: G,
    config: PipelineConfig,
}

impl SuggestionPipeline<HttpTextGenerator> {
    /// Creates a pipeline that talks to an HTTP endpoint.
    #[must_use]
    pub fn from_endpoint(endpoint: impl Into<String>, config: PipelineConfig) -> Self {
        Self::new(HttpTextGenerator::new(endpoint, config.timeout), config)
    }
}

impl<G: TextGenerator> SuggestionPipeline<G> {
    /// Creates a pipeline around any [`TextGenerator`].
    #[must_use]
    pub const fn new(generator: G, config: PipelineConfig) -> Self {
        Self { generator, config }
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns suggestions for the context. Never fails.
    pub async fn get_suggestions(&self, context: &SuggestionContext) -> SuggestionOutcome {
        match self.fetch(context).await {
            Ok(suggestions) => {
                info!(
                    character = %context.character_id,
                    question = %context.question_id,
                    count = suggestions.len(),
                    "Suggestions received"
                );
                SuggestionOutcome::from_service(suggestions)
            }
            Err(e) => {
                let reason = FallbackReason::from(&e);
                warn!(
                    character = %context.character_id,
                    question = %context.question_id,
                    %reason,
                    error = %e,
                    "Using fallback suggestions"
                );
                SuggestionOutcome::from_fallback(
                    fallback::fallback_suggestions(context, self.config.max_suggestions),
                    reason,
                )
            }
        }
    }

    async fn fetch(&self, context: &SuggestionContext) -> Result<Vec<String>, SuggestError> {
        let request = ChatRequest::new(prompt::build_prompt(context));

        let reply = tokio::time::timeout(self.config.timeout, self.generator.generate(&request))
            .await
            .map_err(|_| SuggestError::Timeout {
                secs: self.config.timeout.as_secs(),
            })??;

        if reply.trim().is_empty() {
            return Err(SuggestError::EmptyReply);
        }

        parse::parse_suggestions(&reply, self.config.max_suggestions)
            .ok_or(SuggestError::Unparsable)
    }
}
