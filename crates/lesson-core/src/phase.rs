//! Phases of the character-training activity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LessonError;
use crate::questions::QuestionSet;

/// One step of the training activity.
///
/// The phases are strictly ordered:
/// `selection` -> `pre-training` -> `basic` -> `feedback` -> `advanced`
/// -> `practice` -> `summary` -> `quiz`.
///
/// The only out-of-order move is `skip`, from `feedback` straight to
/// `advanced`, which lands on the same phase as submitting feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Pick a character.
    #[default]
    Selection,
    /// Chat with the untrained character.
    PreTraining,
    /// Answer the basic question set.
    Basic,
    /// Reflect on the basic round.
    Feedback,
    /// Answer the advanced question set.
    Advanced,
    /// Chat with the trained character.
    Practice,
    /// Review what was taught.
    Summary,
    /// Closing quiz. Terminal.
    Quiz,
}

impl Phase {
    /// All phases in order.
    pub const ALL: [Self; 8] = [
        Self::Selection,
        Self::PreTraining,
        Self::Basic,
        Self::Feedback,
        Self::Advanced,
        Self::Practice,
        Self::Summary,
        Self::Quiz,
    ];

    /// Returns the stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Selection => "selection",
            Self::PreTraining => "pre-training",
            Self::Basic => "basic",
            Self::Feedback => "feedback",
            Self::Advanced => "advanced",
            Self::Practice => "practice",
            Self::Summary => "summary",
            Self::Quiz => "quiz",
        }
    }

    /// Returns the following phase, or `None` from `quiz`.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Selection => Some(Self::PreTraining),
            Self::PreTraining => Some(Self::Basic),
            Self::Basic => Some(Self::Feedback),
            Self::Feedback => Some(Self::Advanced),
            Self::Advanced => Some(Self::Practice),
            Self::Practice => Some(Self::Summary),
            Self::Summary => Some(Self::Quiz),
            Self::Quiz => None,
        }
    }

    /// Returns the preceding phase, or `None` from `selection`.
    #[must_use]
    pub const fn previous(&self) -> Option<Self> {
        match self {
            Self::Selection => None,
            Self::PreTraining => Some(Self::Selection),
            Self::Basic => Some(Self::PreTraining),
            Self::Feedback => Some(Self::Basic),
            Self::Advanced => Some(Self::Feedback),
            Self::Practice => Some(Self::Advanced),
            Self::Summary => Some(Self::Practice),
            Self::Quiz => Some(Self::Summary),
        }
    }

    /// Returns the question set answered in this phase, if any.
    #[must_use]
    pub const fn question_set(&self) -> Option<QuestionSet> {
        match self {
            Self::Basic => Some(QuestionSet::Basic),
            Self::Advanced => Some(QuestionSet::Advanced),
            _ => None,
        }
    }

    /// Returns `true` for phases in which the learner can chat.
    #[must_use]
    pub const fn allows_chat(&self) -> bool {
        matches!(self, Self::PreTraining | Self::Practice)
    }

    /// Returns `true` for the final phase.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Quiz)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = LessonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| LessonError::unknown_phase(s))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_next_walks_all_phases() {
        let mut phase = Phase::Selection;
        let mut walked = vec![phase];
        while let Some(next) = phase.next() {
            walked.push(next);
            phase = next;
        }
        assert_eq!(walked, Phase::ALL);
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_previous_inverts_next() {
        for phase in Phase::ALL {
            if let Some(next) = phase.next() {
                assert_eq!(next.previous(), Some(phase));
            }
        }
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            serde_json::to_string(&Phase::PreTraining).unwrap(),
            "\"pre-training\""
        );
        assert_eq!("pre-training".parse::<Phase>().unwrap(), Phase::PreTraining);
        assert!(matches!(
            "warmup".parse::<Phase>(),
            Err(LessonError::UnknownPhase { .. })
        ));
    }

    #[test]
    fn test_question_sets() {
        assert_eq!(Phase::Basic.question_set(), Some(QuestionSet::Basic));
        assert_eq!(Phase::Advanced.question_set(), Some(QuestionSet::Advanced));
        assert_eq!(Phase::Practice.question_set(), None);
    }
}
