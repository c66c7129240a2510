//! The four top-level lesson sections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LessonError;

/// One of the fixed, ordered lesson sections.
///
/// External collaborators refer to sections only by their stable string
/// identifiers, never by position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Opening pages of the lesson.
    #[default]
    Introduction,
    /// Guided explanation.
    Tutorial,
    /// The interactive activity.
    Activity,
    /// The closing code sample. No section follows it.
    Code,
}

impl Section {
    /// All sections in lesson order.
    pub const ALL: [Self; 4] = [Self::Introduction, Self::Tutorial, Self::Activity, Self::Code];

    /// Returns the stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Introduction => "introduction",
            Self::Tutorial => "tutorial",
            Self::Activity => "activity",
            Self::Code => "code",
        }
    }

    /// Returns the following section, or `None` after `code`.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Introduction => Some(Self::Tutorial),
            Self::Tutorial => Some(Self::Activity),
            Self::Activity => Some(Self::Code),
            Self::Code => None,
        }
    }

    /// Returns the preceding section, or `None` at `introduction`.
    #[must_use]
    pub const fn previous(&self) -> Option<Self> {
        match self {
            Self::Introduction => None,
            Self::Tutorial => Some(Self::Introduction),
            Self::Activity => Some(Self::Tutorial),
            Self::Code => Some(Self::Activity),
        }
    }

    /// Returns `true` for the last section of a lesson.
    ///
    /// ```
    /// use lesson_core::Section;
    ///
    /// assert!(Section::Code.is_last());
    /// assert!(!Section::Activity.is_last());
    /// ```
    #[must_use]
    pub const fn is_last(&self) -> bool {
        matches!(self, Self::Code)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = LessonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| LessonError::unknown_section(s))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_linear() {
        let mut walked = vec![Section::Introduction];
        while let Some(next) = walked.last().unwrap().next() {
            walked.push(next);
        }
        assert_eq!(walked, Section::ALL);

        for pair in Section::ALL.windows(2) {
            assert_eq!(pair[1].previous(), Some(pair[0]));
        }
        assert_eq!(Section::Introduction.previous(), None);
    }

    #[test]
    fn test_parse_round_trips_identifiers() {
        for section in Section::ALL {
            assert_eq!(section.as_str().parse::<Section>().unwrap(), section);
            assert_eq!(
                serde_json::to_string(&section).unwrap(),
                format!("\"{section}\"")
            );
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "Appendix".parse::<Section>().unwrap_err();
        assert!(matches!(err, LessonError::UnknownSection { name } if name == "Appendix"));
        assert!("Tutorial".parse::<Section>().is_err());
    }
}
