//! The suggestion panel: one cached result for one open question.
//!
//! Every request is tagged with a [`SuggestionTicket`]. A result is accepted
//! only while its ticket still names the open question and the current
//! character generation; late results for a question the learner navigated
//! away from, or for a character they switched from, are discarded.

use lesson_suggest::SuggestionOutcome;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tag identifying one suggestion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionTicket {
    /// The question the request was issued for.
    pub question_id: String,
    /// The character generation at issue time.
    pub generation: u64,
}

/// Serializable view of the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSnapshot {
    /// The open question.
    pub question_id: String,
    /// `true` until a result is accepted.
    pub loading: bool,
    /// The accepted result, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SuggestionOutcome>,
}

#[derive(Debug, Clone)]
struct OpenPanel {
    ticket: SuggestionTicket,
    outcome: Option<SuggestionOutcome>,
}

/// Caches suggestions for the visible panel.
#[derive(Debug, Clone, Default)]
pub struct SuggestionPanel {
    open: Option<OpenPanel>,
}

impl SuggestionPanel {
    /// Creates a closed panel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the panel for a question, replacing whatever was shown.
    pub fn open(&mut self, question_id: impl Into<String>, generation: u64) -> SuggestionTicket {
        let ticket = SuggestionTicket {
            question_id: question_id.into(),
            generation,
        };
        debug!(question = %ticket.question_id, generation, "Suggestion panel opened");
        self.open = Some(OpenPanel {
            ticket: ticket.clone(),
            outcome: None,
        });
        ticket
    }

    /// Stores `outcome` if `ticket` is still current. Returns whether it was
    /// accepted.
    pub fn resolve(
        &mut self,
        ticket: &SuggestionTicket,
        current_generation: u64,
        outcome: SuggestionOutcome,
    ) -> bool {
        match self.open.as_mut() {
            Some(open) if open.ticket == *ticket && ticket.generation == current_generation => {
                open.outcome = Some(outcome);
                true
            }
            _ => {
                debug!(
                    question = %ticket.question_id,
                    generation = ticket.generation,
                    current_generation,
                    "Discarding stale suggestions"
                );
                false
            }
        }
    }

    /// Closes the panel and drops the cached result.
    pub fn dismiss(&mut self) {
        if self.open.take().is_some() {
            debug!("Suggestion panel dismissed");
        }
    }

    /// Returns `true` while a panel is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Returns the accepted result, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<&SuggestionOutcome> {
        self.open.as_ref().and_then(|open| open.outcome.as_ref())
    }

    /// Returns a serializable view, or `None` when closed.
    #[must_use]
    pub fn snapshot(&self) -> Option<PanelSnapshot> {
        self.open.as_ref().map(|open| PanelSnapshot {
            question_id: open.ticket.question_id.clone(),
            loading: open.outcome.is_none(),
            outcome: open.outcome.clone(),
        })
    }
}
