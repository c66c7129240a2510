//! Lesson Suggestion Pipeline
//!
//! Turns a request for help on a training question into a short, bounded list
//! of example answers.
//!
//! The pipeline asks a remote text-generation service for exactly three
//! numbered alternatives, parses the free-form reply through a cascade of
//! splitting rules, and substitutes a static fallback table whenever the
//! service is slow, failing, or returns text that cannot be split. Callers
//! always receive a non-empty list; failures surface only as a
//! [`FallbackReason`] on the outcome.
//!
//! # Example
//!
//! ```no_run
//! use lesson_suggest::{PipelineConfig, SuggestionContext, SuggestionPipeline};
//!
//! # async fn example() {
//! let pipeline = SuggestionPipeline::from_endpoint(
//!     "http://127.0.0.1:3001/api/chat",
//!     PipelineConfig::default(),
//! );
//!
//! let context = SuggestionContext::new("harry-potter", "Harry Potter", "greeting")
//!     .with_question("How would Harry Potter say hello to a new friend?");
//!
//! let outcome = pipeline.get_suggestions(&context).await;
//! assert!(!outcome.suggestions.is_empty());
//! # }
//! ```

pub mod client;
pub mod fallback;
pub mod parse;
pub mod pipeline;
pub mod prompt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::{ChatReply, ChatRequest, ChatRole, ChatTurn, HttpTextGenerator, TextGenerator};
pub use fallback::fallback_suggestions;
pub use parse::parse_suggestions;
pub use pipeline::{PipelineConfig, SuggestionPipeline, DEFAULT_MAX_SUGGESTIONS, DEFAULT_TIMEOUT_SECS};
pub use prompt::build_prompt;

/// Errors that can occur while talking to the text-generation service.
///
/// These never escape [`SuggestionPipeline::get_suggestions`]; they are
/// converted into a [`FallbackReason`] and replaced with static content.
#[derive(Debug, Error)]
pub enum SuggestError {
    /// The service did not answer within the configured timeout.
    #[error("suggestion service timed out after {secs}s")]
    Timeout {
        /// The timeout that elapsed, in seconds.
        secs: u64,
    },

    /// The request could not be delivered or the connection failed.
    #[error("suggestion service unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("suggestion service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the service (may be empty).
        body: String,
    },

    /// The service answered successfully but the answer was blank.
    #[error("suggestion service returned an empty answer")]
    EmptyReply,

    /// The answer could not be split into at least two suggestions.
    #[error("suggestion reply could not be parsed into a list")]
    Unparsable,

    /// The response body was not the expected `{ "answer": ... }` shape.
    #[error("invalid suggestion response: {0}")]
    InvalidResponse(String),
}

/// Why the pipeline substituted fallback content for a service reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The request timed out.
    Timeout,
    /// The service was unreachable.
    Network,
    /// The service returned a non-2xx status or a malformed body.
    Status,
    /// The service returned an empty answer.
    EmptyReply,
    /// The answer could not be parsed into a list.
    Unparsable,
}

impl From<&SuggestError> for FallbackReason {
    fn from(error: &SuggestError) -> Self {
        match error {
            SuggestError::Timeout { .. } => Self::Timeout,
            SuggestError::Network(_) => Self::Network,
            SuggestError::Status { .. } | SuggestError::InvalidResponse(_) => Self::Status,
            SuggestError::EmptyReply => Self::EmptyReply,
            SuggestError::Unparsable => Self::Unparsable,
        }
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Network => write!(f, "network"),
            Self::Status => write!(f, "status"),
            Self::EmptyReply => write!(f, "empty_reply"),
            Self::Unparsable => write!(f, "unparsable"),
        }
    }
}

/// Where the suggestions in an outcome came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestionSource {
    /// Parsed from the text-generation service reply.
    Service,
    /// Substituted from the fallback table.
    Fallback {
        /// The failure that triggered the substitution.
        reason: FallbackReason,
    },
}

/// Everything needed to build a suggestion prompt for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionContext {
    /// Stable character identifier used to key the fallback table.
    pub character_id: String,
    /// Display name of the character.
    pub character_name: String,
    /// Personality traits woven into the prompt.
    #[serde(default)]
    pub traits: Vec<String>,
    /// Identifier of the question being answered.
    pub question_id: String,
    /// Question text as shown to the learner.
    #[serde(default)]
    pub question: String,
    /// The learner's current answer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_attempt: Option<String>,
}

impl SuggestionContext {
    /// Creates a context with no traits, question text, or prior attempt.
    #[must_use]
    pub fn new(
        character_id: impl Into<String>,
        character_name: impl Into<String>,
        question_id: impl Into<String>,
    ) -> Self {
        Self {
            character_id: character_id.into(),
            character_name: character_name.into(),
            traits: Vec::new(),
            question_id: question_id.into(),
            question: String::new(),
            prior_attempt: None,
        }
    }

    /// Sets the question text.
    #[must_use]
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }

    /// Sets the personality traits.
    #[must_use]
    pub fn with_traits<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traits = traits.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the learner's prior attempt. Blank attempts are ignored.
    #[must_use]
    pub fn with_prior_attempt(mut self, attempt: impl Into<String>) -> Self {
        let attempt = attempt.into();
        self.prior_attempt = if attempt.trim().is_empty() {
            None
        } else {
            Some(attempt)
        };
        self
    }
}

/// The resolved result of a suggestion request.
///
/// `suggestions` is never empty and holds at most the configured maximum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionOutcome {
    /// Ordered suggestions to render as clickable choices.
    pub suggestions: Vec<String>,
    /// Whether these came from the service or the fallback table.
    pub source: SuggestionSource,
}

impl SuggestionOutcome {
    /// Creates an outcome from parsed service suggestions.
    #[must_use]
    pub const fn from_service(suggestions: Vec<String>) -> Self {
        Self {
            suggestions,
            source: SuggestionSource::Service,
        }
    }

    /// Creates an outcome from fallback-table suggestions.
    #[must_use]
    pub const fn from_fallback(suggestions: Vec<String>, reason: FallbackReason) -> Self {
        Self {
            suggestions,
            source: SuggestionSource::Fallback { reason },
        }
    }

    /// Returns `true` if the suggestions came from the fallback table.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.source, SuggestionSource::Fallback { .. })
    }

    /// Returns the transient notice to show the learner, if any.
    #[must_use]
    pub const fn notice(&self) -> Option<&'static str> {
        match self.source {
            SuggestionSource::Service => None,
            SuggestionSource::Fallback { .. } => {
                Some("The helper is taking a break, so here are some example answers instead.")
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_reason_from_error() {
        assert_eq!(
            FallbackReason::from(&SuggestError::Timeout { secs: 6 }),
            FallbackReason::Timeout
        );
        assert_eq!(
            FallbackReason::from(&SuggestError::Status {
                status: 500,
                body: "boom".to_string()
            }),
            FallbackReason::Status
        );
        assert_eq!(
            FallbackReason::from(&SuggestError::InvalidResponse("no answer".to_string())),
            FallbackReason::Status
        );
        assert_eq!(
            FallbackReason::from(&SuggestError::EmptyReply),
            FallbackReason::EmptyReply
        );
    }

    #[test]
    fn test_error_display() {
        let err = SuggestError::Status {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "suggestion service returned 503: overloaded");
        assert_eq!(
            SuggestError::Timeout { secs: 6 }.to_string(),
            "suggestion service timed out after 6s"
        );
    }

    #[test]
    fn test_context_builder() {
        let context = SuggestionContext::new("harry-potter", "Harry Potter", "greeting")
            .with_question("How would Harry say hello?")
            .with_traits(["brave", "loyal"])
            .with_prior_attempt("   ");

        assert_eq!(context.traits, vec!["brave", "loyal"]);
        assert_eq!(context.question, "How would Harry say hello?");
        assert!(context.prior_attempt.is_none());

        let context = context.with_prior_attempt("Hi!");
        assert_eq!(context.prior_attempt.as_deref(), Some("Hi!"));
    }

    #[test]
    fn test_outcome_notice() {
        let service = SuggestionOutcome::from_service(vec!["a".to_string(), "b".to_string()]);
        assert!(!service.is_fallback());
        assert!(service.notice().is_none());

        let fallback =
            SuggestionOutcome::from_fallback(vec!["a".to_string()], FallbackReason::Network);
        assert!(fallback.is_fallback());
        assert!(fallback.notice().is_some());
    }

    #[test]
    fn test_source_serialization() {
        let json = serde_json::to_string(&SuggestionSource::Fallback {
            reason: FallbackReason::EmptyReply,
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"fallback","reason":"empty_reply"}"#);

        let json = serde_json::to_string(&SuggestionSource::Service).unwrap();
        assert_eq!(json, r#"{"kind":"service"}"#);
    }
}
