//! Gate predicates guarding forward transitions.
//!
//! These are the only implementations of each gate. The activity engine
//! enforces them and the session snapshot uses the same functions to tell a
//! front end whether its "continue" control should be enabled.

use std::collections::BTreeMap;

use crate::phase::Phase;
use crate::questions::{self, QuestionSet};
use crate::responses::TrainingResponses;
use crate::section::Section;

/// Snapshot of the state a phase gate reads.
#[derive(Debug, Clone, Copy)]
pub struct GateInputs<'a> {
    /// Whether a character has been selected.
    pub character_selected: bool,
    /// The learner's training responses.
    pub responses: &'a TrainingResponses,
    /// Quiz answers keyed by quiz question identifier.
    pub quiz_answers: &'a BTreeMap<String, usize>,
}

/// Returns `true` if the learner may leave `phase` going forward.
///
/// `selection` needs a character; `basic` and `advanced` need every question
/// in their set answered with non-blank text. Other phases have no
/// precondition.
#[must_use]
pub fn phase_complete(phase: Phase, inputs: &GateInputs<'_>) -> bool {
    match phase {
        Phase::Selection => inputs.character_selected,
        _ => phase
            .question_set()
            .map_or(true, |set| questions_answered(set, inputs.responses)),
    }
}

/// Returns `true` if every question in `set` has a non-blank answer.
#[must_use]
pub fn questions_answered(set: QuestionSet, responses: &TrainingResponses) -> bool {
    questions::questions(set).all(|q| responses.is_answered(q.id))
}

/// Lists the questions in `set` that still lack a non-blank answer.
#[must_use]
pub fn missing_questions(set: QuestionSet, responses: &TrainingResponses) -> Vec<&'static str> {
    questions::questions(set)
        .filter(|q| !responses.is_answered(q.id))
        .map(|q| q.id)
        .collect()
}

/// Returns `true` once every quiz question has an answer.
#[must_use]
pub fn quiz_answered(answers: &BTreeMap<String, usize>) -> bool {
    questions::quiz().iter().all(|q| answers.contains_key(q.id))
}

/// Returns `true` if the navigator may move forward from `section`.
#[must_use]
pub const fn section_may_advance(section: Section, at_section_end: bool) -> bool {
    at_section_end && !section.is_last()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_basic() -> TrainingResponses {
        let mut responses = TrainingResponses::new();
        for q in questions::questions(QuestionSet::Basic) {
            responses.record(q.id, "an answer");
        }
        responses
    }

    #[test]
    fn test_selection_needs_character() {
        let responses = TrainingResponses::new();
        let quiz = BTreeMap::new();
        let mut inputs = GateInputs {
            character_selected: false,
            responses: &responses,
            quiz_answers: &quiz,
        };
        assert!(!phase_complete(Phase::Selection, &inputs));
        inputs.character_selected = true;
        assert!(phase_complete(Phase::Selection, &inputs));
    }

    #[test]
    fn test_blank_answer_blocks_phase() {
        let mut responses = all_basic();
        responses.record("greeting", "   ");
        let quiz = BTreeMap::new();
        let inputs = GateInputs {
            character_selected: true,
            responses: &responses,
            quiz_answers: &quiz,
        };
        assert!(!phase_complete(Phase::Basic, &inputs));
        assert_eq!(missing_questions(QuestionSet::Basic, &responses), vec!["greeting"]);
    }

    #[test]
    fn test_each_set_is_gated_independently() {
        let responses = all_basic();
        let quiz = BTreeMap::new();
        let inputs = GateInputs {
            character_selected: true,
            responses: &responses,
            quiz_answers: &quiz,
        };
        assert!(phase_complete(Phase::Basic, &inputs));
        assert!(!phase_complete(Phase::Advanced, &inputs));
        assert_eq!(
            missing_questions(QuestionSet::Advanced, &responses),
            vec!["hard-day", "advice", "secret"]
        );
    }

    #[test]
    fn test_ungated_phases_always_pass() {
        let responses = TrainingResponses::new();
        let quiz = BTreeMap::new();
        let inputs = GateInputs {
            character_selected: false,
            responses: &responses,
            quiz_answers: &quiz,
        };
        for phase in [
            Phase::PreTraining,
            Phase::Feedback,
            Phase::Practice,
            Phase::Summary,
            Phase::Quiz,
        ] {
            assert!(phase_complete(phase, &inputs), "{phase} should be ungated");
        }
    }

    #[test]
    fn test_quiz_answered() {
        let mut answers = BTreeMap::new();
        assert!(!quiz_answered(&answers));
        for q in questions::quiz() {
            answers.insert(q.id.to_string(), 0);
        }
        assert!(quiz_answered(&answers));
    }

    #[test]
    fn test_section_gate() {
        assert!(!section_may_advance(Section::Tutorial, false));
        assert!(section_may_advance(Section::Tutorial, true));
        assert!(!section_may_advance(Section::Code, true));
    }
}
