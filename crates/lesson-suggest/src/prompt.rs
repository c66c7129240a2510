//! Prompt construction for suggestion requests.

use std::fmt::Write;

use crate::SuggestionContext;

/// Builds the natural-language prompt for a suggestion request.
///
/// The prompt always asks for exactly three numbered alternatives so the
/// first parsing rule has markers to split on.
#[must_use]
pub fn build_prompt(context: &SuggestionContext) -> String {
    let name = context.character_name.trim();
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are helping a young learner teach an AI to talk like {name}."
    );

    let traits: Vec<&str> = context
        .traits
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if !traits.is_empty() {
        let _ = writeln!(prompt, "{name}'s personality: {}.", traits.join(", "));
    }

    let question = context.question.trim();
    if !question.is_empty() {
        let _ = writeln!(prompt, "Question: {question}");
    }

    if let Some(attempt) = context
        .prior_attempt
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
    {
        let _ = writeln!(
            prompt,
            "The learner's current answer is: \"{attempt}\". Keep their idea but make it sound more like {name}."
        );
    }

    let _ = writeln!(
        prompt,
        "Write exactly three different short answers that {name} might give, in {name}'s own voice."
    );
    prompt.push_str("Number them 1., 2. and 3., one per line, with no other text.");

    prompt
}
