//! Error types for the lesson viewer core.
//!
//! Invalid transitions are deliberately absent: they are absorbed as no-ops
//! by the state machines. The variants here cover configuration loading and
//! the "not found" class, which is the one failure shown to the learner.

use std::path::PathBuf;

/// A specialized `Result` type for lesson core operations.
pub type Result<T> = std::result::Result<T, LessonError>;

/// The single recovery action offered for "not found" failures.
pub const RETURN_TO_LESSON_LIST: &str = "Return to the lesson list";

/// Errors that can occur in the lesson viewer core.
#[derive(Debug, thiserror::Error)]
pub enum LessonError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your lesson.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Missing Data
    // ========================================================================
    /// No lesson is registered under the requested identifier.
    #[error("Lesson not found: '{id}'\n\nSuggestion: Return to the lesson list and pick an available lesson")]
    LessonNotFound {
        /// The identifier that was requested.
        id: String,
    },

    /// No character matches the requested name or identifier.
    #[error("Character not found: '{name}'\n\nSuggestion: Return to the lesson list, or pick one of the listed characters")]
    CharacterNotFound {
        /// The name that was requested.
        name: String,
    },

    // ========================================================================
    // Identifier Parsing
    // ========================================================================
    /// A section name did not match any known section.
    #[error("Unknown section: '{name}' (expected introduction, tutorial, activity or code)")]
    UnknownSection {
        /// The rejected name.
        name: String,
    },

    /// A phase name did not match any known phase.
    #[error("Unknown phase: '{name}'")]
    UnknownPhase {
        /// The rejected name.
        name: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LessonError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `LessonNotFound` error.
    #[must_use]
    pub fn lesson_not_found(id: impl Into<String>) -> Self {
        Self::LessonNotFound { id: id.into() }
    }

    /// Creates a new `CharacterNotFound` error.
    #[must_use]
    pub fn character_not_found(name: impl Into<String>) -> Self {
        Self::CharacterNotFound { name: name.into() }
    }

    /// Creates a new `UnknownSection` error.
    #[must_use]
    pub fn unknown_section(name: impl Into<String>) -> Self {
        Self::UnknownSection { name: name.into() }
    }

    /// Creates a new `UnknownPhase` error.
    #[must_use]
    pub fn unknown_phase(name: impl Into<String>) -> Self {
        Self::UnknownPhase { name: name.into() }
    }

    /// Returns `true` for the terminal "not found" class of errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::LessonNotFound { .. } | Self::CharacterNotFound { .. }
        )
    }

    /// Returns the recovery action to present alongside a "not found" error.
    #[must_use]
    pub const fn recovery_action(&self) -> Option<&'static str> {
        if self.is_not_found() {
            Some(RETURN_TO_LESSON_LIST)
        } else {
            None
        }
    }

    /// Returns `true` if this error should abort start-up.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. } | Self::ConfigValidationError { .. }
        )
    }
}
