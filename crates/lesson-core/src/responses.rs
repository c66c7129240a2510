//! The learner's training responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Learner-authored answers keyed by question identifier.
///
/// Writes are unconditional upserts and are never validated; whether an
/// answer counts is decided by the gate predicates at read time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingResponses {
    answers: BTreeMap<String, String>,
}

impl TrainingResponses {
    /// Creates an empty response map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the answer for `question_id`.
    pub fn record(&mut self, question_id: impl Into<String>, text: impl Into<String>) {
        self.answers.insert(question_id.into(), text.into());
    }

    /// Returns the raw answer for `question_id`.
    #[must_use]
    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    /// Returns `true` if the answer exists and is not blank after trimming.
    #[must_use]
    pub fn is_answered(&self, question_id: &str) -> bool {
        self.get(question_id)
            .is_some_and(|text| !text.trim().is_empty())
    }

    /// Iterates over non-blank answers.
    pub fn answered(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(id, text)| (id.as_str(), text.as_str()))
    }

    /// Removes every answer.
    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Returns the number of stored answers, blank ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_upsert() {
        let mut responses = TrainingResponses::new();
        responses.record("greeting", "hi");
        responses.record("greeting", "hello");
        assert_eq!(responses.len(), 1);
        assert_eq!(responses.get("greeting"), Some("hello"));
    }

    #[test]
    fn test_blank_answers_are_stored_but_not_answered() {
        let mut responses = TrainingResponses::new();
        responses.record("greeting", "   ");
        assert_eq!(responses.len(), 1);
        assert!(!responses.is_answered("greeting"));
        assert_eq!(responses.answered().count(), 0);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut responses = TrainingResponses::new();
        responses.record("greeting", "hi");
        assert_eq!(
            serde_json::to_string(&responses).unwrap_or_default(),
            r#"{"greeting":"hi"}"#
        );
    }
}
