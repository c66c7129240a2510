//! Built-in character roster for the training activity.
//!
//! Each character carries a canned reply table keyed by topic. Topics are the
//! training question identifiers, so learner responses can later be merged
//! over the canned table one-for-one.

use serde::Serialize;

use crate::questions;

/// A character the learner can train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Stable identifier, e.g. `harry-potter`.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Personality traits used when asking for suggestions.
    pub traits: &'static [&'static str],
    /// First line shown when chat opens.
    pub greeting: &'static str,
    /// Canned replies keyed by topic (a question identifier).
    #[serde(skip)]
    pub canned: &'static [(&'static str, &'static str)],
    /// Reply used when no topic matches.
    #[serde(skip)]
    pub default_reply: &'static str,
}

static ROSTER: [Character; 3] = [
    Character {
        id: "harry-potter",
        name: "Harry Potter",
        traits: &["brave", "loyal", "a bit reckless"],
        greeting: "Hi, I'm Harry. Ask me anything!",
        canned: &[
            ("greeting", "Hey! I'm Harry. Nice to meet you."),
            ("favorite-thing", "Quidditch, definitely. Flying is the best feeling."),
            ("problem-solving", "I usually just go for it and hope Hermione has a plan."),
        ],
        default_reply: "Er, I'm not sure what you mean. Want to talk about Quidditch?",
    },
    Character {
        id: "hermione-granger",
        name: "Hermione Granger",
        traits: &["clever", "hard-working", "kind"],
        greeting: "Hello! I'm Hermione. What would you like to know?",
        canned: &[
            ("greeting", "Hello, I'm Hermione Granger. Pleased to meet you."),
            ("favorite-thing", "Books! The library is my favourite place."),
            ("problem-solving", "I research it properly and make a plan."),
        ],
        default_reply: "I don't know the answer to that yet, but I'll look it up.",
    },
    Character {
        id: "sherlock-holmes",
        name: "Sherlock Holmes",
        traits: &["observant", "logical", "curious"],
        greeting: "Good day. I am Sherlock Holmes. State your case.",
        canned: &[
            ("greeting", "Good day. You have questions, I can tell."),
            ("favorite-thing", "A puzzle that nobody else can solve."),
            ("problem-solving", "I observe, I deduce, I conclude."),
        ],
        default_reply: "Insufficient data. Ask me something more precise.",
    },
];

/// Returns every built-in character.
#[must_use]
pub fn roster() -> &'static [Character] {
    &ROSTER
}

/// Finds a character by identifier or display name, ignoring case and spacing.
#[must_use]
pub fn find_character(name_or_id: &str) -> Option<&'static Character> {
    let wanted = normalize(name_or_id);
    if wanted.is_empty() {
        return None;
    }
    ROSTER
        .iter()
        .find(|c| normalize(c.id) == wanted || normalize(c.name) == wanted)
}

impl Character {
    /// Returns the canned reply for a topic.
    #[must_use]
    pub fn canned_for(&self, topic: &str) -> Option<&'static str> {
        self.canned
            .iter()
            .find(|(t, _)| *t == topic)
            .map(|(_, reply)| *reply)
    }

    /// Replies to a chat message from the canned table, falling back to the
    /// character's default reply when no topic keyword matches.
    #[must_use]
    pub fn canned_reply(&self, message: &str) -> &'static str {
        questions::match_topic(message)
            .and_then(|topic| self.canned_for(topic))
            .unwrap_or(self.default_reply)
    }
}

fn normalize(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}
