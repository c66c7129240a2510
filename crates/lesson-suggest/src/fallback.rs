//! Consolidated fallback suggestion table.
//!
//! One table keyed by character id, with per-question entries and a general
//! entry per character. Unknown characters get a generic entry templated on
//! the display name. Every entry holds at least two suggestions.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::SuggestionContext;

/// Fallback suggestions for one known character.
struct CharacterFallback {
    /// Suggestions keyed by question id.
    by_question: &'static [(&'static str, [&'static str; 3])],
    /// Suggestions used when no question-specific entry exists.
    general: [&'static str; 3],
}

static TABLE: Lazy<HashMap<&'static str, CharacterFallback>> = Lazy::new(|| {
    HashMap::from([
        (
            "harry-potter",
            CharacterFallback {
                by_question: &[
                    (
                        "greeting",
                        [
                            "Hi! I'm Harry. Fancy a game of Quidditch later?",
                            "Hello there! Any friend of Ron's is a friend of mine.",
                            "Wotcher! Welcome to Hogwarts, you'll love it here.",
                        ],
                    ),
                    (
                        "favorite-thing",
                        [
                            "Flying on my Firebolt, nothing beats it!",
                            "Playing Seeker for the Gryffindor Quidditch team.",
                            "Hanging out with Ron and Hermione in the common room.",
                        ],
                    ),
                    (
                        "problem-solving",
                        [
                            "I'd ask Hermione, then charge in bravely anyway.",
                            "Follow my gut and stick with my friends.",
                            "Sneak out under my Invisibility Cloak and investigate!",
                        ],
                    ),
                ],
                general: [
                    "That's brilliant! Let's do it together.",
                    "I'm not sure, but I'll be brave and give it a go.",
                    "My friends and I will figure it out, we always do.",
                ],
            },
        ),
        (
            "hermione-granger",
            CharacterFallback {
                by_question: &[
                    (
                        "greeting",
                        [
                            "Hello! I'm Hermione Granger. Have you read Hogwarts: A History?",
                            "Nice to meet you! Do you need help with your homework?",
                            "Hi! I've already learned all our spells for this term.",
                        ],
                    ),
                    (
                        "favorite-thing",
                        [
                            "Reading in the library, obviously!",
                            "Learning new spells before anyone else does.",
                            "Making lists, they keep everything organised.",
                        ],
                    ),
                    (
                        "problem-solving",
                        [
                            "Let's look it up in the library first.",
                            "Make a plan, check the rules, then follow the plan.",
                            "There's always a logical answer if you think carefully.",
                        ],
                    ),
                ],
                general: [
                    "Actually, I read about this in a book!",
                    "We should think about this logically.",
                    "Honestly, it's not that hard if you study.",
                ],
            },
        ),
        (
            "sherlock-holmes",
            CharacterFallback {
                by_question: &[
                    (
                        "greeting",
                        [
                            "Good day. You've travelled far, I perceive.",
                            "Ah, a visitor. Do come in and tell me everything.",
                            "How do you do? I see you are fond of puzzles.",
                        ],
                    ),
                    (
                        "favorite-thing",
                        [
                            "Solving a mystery that baffles Scotland Yard.",
                            "Playing my violin while I think.",
                            "Observing the tiny details everyone else misses.",
                        ],
                    ),
                    (
                        "problem-solving",
                        [
                            "Observe every detail, then eliminate the impossible.",
                            "Gather the facts first. Never guess.",
                            "Whatever remains, however improbable, must be the truth.",
                        ],
                    ),
                ],
                general: [
                    "Elementary, my dear friend.",
                    "The answer is hidden in the details.",
                    "Let us examine the evidence together.",
                ],
            },
        ),
    ])
});

/// Returns fallback suggestions for the context, at most `max` of them.
///
/// Lookup order: character and question, then the character's general entry,
/// then a generic entry templated on the display name. The result is never
/// empty.
#[must_use]
pub fn fallback_suggestions(context: &SuggestionContext, max: usize) -> Vec<String> {
    let max = max.max(1);
    let key = normalize_key(&context.character_id);

    let mut suggestions: Vec<String> = match TABLE.get(key.as_str()) {
        Some(entry) => entry
            .by_question
            .iter()
            .find(|(question_id, _)| *question_id == context.question_id)
            .map_or(&entry.general, |(_, items)| items)
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        None => generic_suggestions(&context.character_name),
    };

    suggestions.truncate(max);
    suggestions
}

/// Returns `true` if the table has an entry for the character id.
#[must_use]
pub fn is_known_character(character_id: &str) -> bool {
    TABLE.contains_key(normalize_key(character_id).as_str())
}

fn generic_suggestions(character_name: &str) -> Vec<String> {
    let name = match character_name.trim() {
        "" => "your character",
        name => name,
    };

    vec![
        format!("Hi there! I'm {name}, and I'm happy to help."),
        format!("{name} would think carefully and then give it a go."),
        format!("{name} would smile and say: let's figure this out together!"),
    ]
}

/// Accepts either an id or a display name ("Harry Potter" -> "harry-potter").
fn normalize_key(raw: &str) -> String {
    raw.trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}
