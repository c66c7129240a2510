//! Configuration for the lesson viewer.
//!
//! Loaded from `lesson.json` (camelCase). Every field has a default, unknown
//! fields are ignored, and the result is validated after loading. A missing
//! file yields the default configuration.

use std::path::Path;
use std::time::Duration;

use lesson_suggest::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::error::{LessonError, Result};
use crate::registry::LessonRegistry;

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "lesson.json";

/// Default text-generation endpoint.
fn default_suggestion_endpoint() -> String {
    "http://127.0.0.1:3001/api/chat".to_string()
}

/// Default suggestion request timeout in seconds.
const fn default_suggestion_timeout_secs() -> u64 {
    lesson_suggest::DEFAULT_TIMEOUT_SECS
}

/// Default number of suggestions shown.
const fn default_max_suggestions() -> usize {
    lesson_suggest::DEFAULT_MAX_SUGGESTIONS
}

/// Default notice lifetime in seconds.
const fn default_notice_ttl_secs() -> u64 {
    5
}

/// Default per-client event buffer.
const fn default_event_buffer_size() -> usize {
    100
}

/// Lesson loaded when a session starts.
fn default_lesson() -> String {
    "train-a-character".to_string()
}

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Endpoint of the external text-generation service.
    #[serde(default = "default_suggestion_endpoint")]
    pub suggestion_endpoint: String,

    /// Timeout applied to every suggestion request.
    #[serde(default = "default_suggestion_timeout_secs")]
    pub suggestion_timeout_secs: u64,

    /// Maximum suggestions shown for one question.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// How long notices stay visible.
    #[serde(default = "default_notice_ttl_secs")]
    pub notice_ttl_secs: u64,

    /// Events buffered per WebSocket client before it lags.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Lesson loaded when a session starts.
    #[serde(default = "default_lesson")]
    pub default_lesson: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            suggestion_endpoint: default_suggestion_endpoint(),
            suggestion_timeout_secs: default_suggestion_timeout_secs(),
            max_suggestions: default_max_suggestions(),
            notice_ttl_secs: default_notice_ttl_secs(),
            event_buffer_size: default_event_buffer_size(),
            default_lesson: default_lesson(),
        }
    }
}

impl Config {
    /// Loads `lesson.json` from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            LessonError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `lesson.json` from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::ConfigParseError` if the file cannot be read or
    /// is not valid JSON, and `LessonError::ConfigValidationError` if a value
    /// is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(LessonError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| LessonError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration against the built-in lessons.
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&LessonRegistry::builtin())
    }

    /// Validates the configuration against `registry`.
    ///
    /// - `suggestionEndpoint` must be an `http://` or `https://` URL
    /// - `suggestionTimeoutSecs` must be between 1 and 30
    /// - `maxSuggestions` must be 2 or 3
    /// - `noticeTtlSecs` and `eventBufferSize` must be greater than 0
    /// - `defaultLesson` must be registered
    pub fn validate_with(&self, registry: &LessonRegistry) -> Result<()> {
        let endpoint = self.suggestion_endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(LessonError::config_validation(
                format!("suggestionEndpoint '{endpoint}' is not an http(s) URL"),
                "Set suggestionEndpoint to something like http://127.0.0.1:3001/api/chat in your lesson.json",
            ));
        }

        if !(1..=30).contains(&self.suggestion_timeout_secs) {
            return Err(LessonError::config_validation(
                format!(
                    "suggestionTimeoutSecs must be between 1 and 30 (got {})",
                    self.suggestion_timeout_secs
                ),
                "A value between 5 and 8 seconds works well in your lesson.json",
            ));
        }

        if !(2..=3).contains(&self.max_suggestions) {
            return Err(LessonError::config_validation(
                format!("maxSuggestions must be 2 or 3 (got {})", self.max_suggestions),
                "Set maxSuggestions to 3 in your lesson.json",
            ));
        }

        if self.notice_ttl_secs == 0 {
            return Err(LessonError::config_validation(
                "noticeTtlSecs must be greater than 0",
                "Set noticeTtlSecs to at least 1 second in your lesson.json",
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(LessonError::config_validation(
                "eventBufferSize must be greater than 0",
                "Set eventBufferSize to at least 1 in your lesson.json",
            ));
        }

        if !registry.contains(&self.default_lesson) {
            return Err(LessonError::config_validation(
                format!("defaultLesson '{}' is not a known lesson", self.default_lesson),
                "Run 'lesson lessons' to see the available lesson ids",
            ));
        }

        Ok(())
    }

    /// Returns the suggestion pipeline settings.
    #[must_use]
    pub const fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            timeout: Duration::from_secs(self.suggestion_timeout_secs),
            max_suggestions: self.max_suggestions,
        }
    }

    /// Returns how long notices stay visible.
    #[must_use]
    pub const fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }
}
