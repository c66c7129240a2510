//! Client for the external text-generation endpoint.
//!
//! The wire contract is a `POST` with body
//! `{ "message": ..., "conversationHistory": [{ "role", "content" }] }`
//! answered by `{ "answer": ... }` on success, or a non-2xx status with an
//! error body on failure.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::SuggestError;

/// Speaker of a turn in the conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The learner.
    User,
    /// The text-generation service.
    Assistant,
}

/// One prior turn sent alongside a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who spoke.
    pub role: ChatRole,
    /// What was said.
    pub content: String,
}

impl ChatTurn {
    /// Creates a learner turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Creates a service turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request body for the text-generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The prompt text.
    pub message: String,
    /// Optional prior turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<ChatTurn>>,
}

impl ChatRequest {
    /// Creates a request with no conversation history.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_history: None,
        }
    }

    /// Attaches prior turns to the request.
    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.conversation_history = Some(history);
        self
    }
}

/// Successful response body from the text-generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// The generated text.
    pub answer: String,
}

/// Anything that can turn a [`ChatRequest`] into reply text.
///
/// The pipeline is generic over this so tests and alternative backends can
/// stand in for the HTTP client.
pub trait TextGenerator: Send + Sync {
    /// Sends the request and returns the raw answer text.
    fn generate(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, SuggestError>> + Send;
}

/// [`TextGenerator`] backed by an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpTextGenerator {
    endpoint: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl HttpTextGenerator {
    /// Creates a client for `endpoint` whose requests time out after `timeout`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lesson-viewer/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.into(),
            timeout,
            http_client,
        }
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, request: &ChatRequest) -> Result<String, SuggestError> {
        debug!(endpoint = %self.endpoint, "Requesting suggestions");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SuggestError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatReply = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(e)
            } else {
                SuggestError::InvalidResponse(e.to_string())
            }
        })?;

        if reply.answer.trim().is_empty() {
            return Err(SuggestError::EmptyReply);
        }

        Ok(reply.answer)
    }
}

impl HttpTextGenerator {
    fn classify(&self, error: reqwest::Error) -> SuggestError {
        if error.is_timeout() {
            SuggestError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            SuggestError::Network(error)
        }
    }
}
