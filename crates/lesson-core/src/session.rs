//! One learner's lesson session.
//!
//! The session owns a single [`SignalBus`] and wires everything else to it:
//! the [`LessonNavigator`] subscribes first, then a forwarder that relays
//! every completion signal to the [`EventBroadcaster`]. Mounted content
//! publishes on the same bus, so the navigator learns about completion
//! without the session relaying anything by hand.
//!
//! Content is remounted whenever the active section changes.

use std::sync::Arc;
use std::time::Duration;

use lesson_suggest::{SuggestionContext, SuggestionOutcome};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::content::{ContentContext, ContentKind, ContentProgress, SectionContent};
use crate::engine::{ActivityEngine, ActivitySnapshot, GenerationSource};
use crate::error::Result;
use crate::events::{EventBroadcaster, LessonEvent};
use crate::navigator::{LessonNavigator, NavigatorState};
use crate::notice::{Notice, NoticeBoard, NoticeKind};
use crate::panel::{PanelSnapshot, SuggestionPanel, SuggestionTicket};
use crate::registry::{LessonDefinition, LessonRegistry};
use crate::section::Section;
use crate::signal::{SignalBus, Subscription};

/// Notice shown when a forward move is blocked by unanswered questions.
pub const INCOMPLETE_QUESTIONS_NOTICE: &str = "Please complete all questions before moving on.";

// ============================================================================
// Snapshot
// ============================================================================

/// Serializable view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// The loaded lesson.
    pub lesson_id: String,
    /// Display title of the loaded lesson.
    pub lesson_title: String,
    /// The active section.
    pub section: Section,
    /// Whether the active section has signalled its end.
    pub at_section_end: bool,
    /// Whether the continue control is enabled.
    pub can_continue: bool,
    /// Set once the end of `code` has been reached.
    pub lesson_complete: bool,
    /// What kind of content is mounted.
    pub content: ContentKind,
    /// Position within the mounted content.
    pub progress: ContentProgress,
    /// The activity engine, while the training activity is mounted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivitySnapshot>,
    /// The suggestion panel, while open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<PanelSnapshot>,
    /// Notices that have not expired.
    #[serde(default)]
    pub notices: Vec<Notice>,
}

// ============================================================================
// Session
// ============================================================================

/// Ties the navigator, mounted content, suggestion panel and notices together.
#[derive(Debug)]
pub struct LessonSession {
    registry: Arc<LessonRegistry>,
    bus: SignalBus,
    generations: GenerationSource,
    navigator: LessonNavigator,
    lesson: LessonDefinition,
    content: Box<dyn SectionContent>,
    panel: SuggestionPanel,
    notices: NoticeBoard,
    broadcaster: EventBroadcaster,
    _forwarder: Subscription,
}

impl LessonSession {
    /// Starts a session on `lesson_id` at the introduction.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::LessonNotFound` if the lesson is not registered.
    pub fn new(
        registry: Arc<LessonRegistry>,
        lesson_id: &str,
        notice_ttl: Duration,
        broadcaster: EventBroadcaster,
    ) -> Result<Self> {
        let lesson = registry.get(lesson_id)?.clone();
        let bus = SignalBus::new();

        // The navigator must see a signal before observers are told about it.
        let navigator = LessonNavigator::new(&bus);
        let relay = broadcaster.clone();
        let forwarder = bus.subscribe(move |signal| {
            relay.send(LessonEvent::SectionEnd(signal.clone()));
        });

        let generations = GenerationSource::new();
        let context = ContentContext {
            lesson_id: lesson.id.clone(),
            bus: bus.clone(),
            generations: generations.clone(),
        };
        let content = lesson.mount(Section::Introduction, &context);
        info!(lesson = %lesson.id, "Lesson session started");

        Ok(Self {
            registry,
            bus,
            generations,
            navigator,
            lesson,
            content,
            panel: SuggestionPanel::new(),
            notices: NoticeBoard::new(notice_ttl),
            broadcaster,
            _forwarder: forwarder,
        })
    }

    /// Returns the loaded lesson's identifier.
    #[must_use]
    pub fn lesson_id(&self) -> &str {
        &self.lesson.id
    }

    /// Returns the navigator state.
    #[must_use]
    pub fn navigator_state(&self) -> NavigatorState {
        self.navigator.state()
    }

    /// Returns the session's signal bus.
    #[must_use]
    pub const fn bus(&self) -> &SignalBus {
        &self.bus
    }

    /// Returns the mounted content.
    #[must_use]
    pub fn content(&self) -> &dyn SectionContent {
        self.content.as_ref()
    }

    /// Returns the activity engine, while the training activity is mounted.
    #[must_use]
    pub fn activity(&self) -> Option<&ActivityEngine> {
        self.content.activity()
    }

    // ------------------------------------------------------------------------
    // Sections
    // ------------------------------------------------------------------------

    /// Replaces the loaded lesson and returns to its introduction.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::LessonNotFound` if the lesson is not registered.
    /// The current lesson is left untouched.
    pub fn load_lesson(&mut self, lesson_id: &str) -> Result<()> {
        let lesson = self.registry.get(lesson_id)?.clone();
        let previous = self.navigator.active_section();

        self.lesson = lesson;
        self.navigator.reset();
        info!(lesson = %self.lesson.id, "Lesson loaded");
        self.sync_section(previous, true);
        Ok(())
    }

    /// Makes the named section active. Unknown names are a no-op.
    pub fn set_section(&mut self, name: &str) -> bool {
        let previous = self.navigator.active_section();
        if !self.navigator.set_active_section_by_name(name) {
            return false;
        }
        self.sync_section(previous, true);
        true
    }

    /// Moves to the next section if the active one has ended.
    pub fn continue_section(&mut self) -> bool {
        let previous = self.navigator.active_section();
        let moved = self.navigator.advance();
        self.sync_section(previous, false);
        moved
    }

    /// Moves to the previous section.
    pub fn back_section(&mut self) -> bool {
        let previous = self.navigator.active_section();
        let moved = self.navigator.back();
        self.sync_section(previous, false);
        moved
    }

    /// Signals the end of the active section and moves past it.
    ///
    /// Returns `false` at `code`, where the lesson is marked complete instead.
    pub fn complete_section(&mut self) -> bool {
        let previous = self.navigator.active_section();
        let moved = self.navigator.complete_content();
        self.sync_section(previous, false);
        moved
    }

    /// Steps the mounted content forward.
    pub fn content_next(&mut self) -> bool {
        let before = self.content.activity().map(ActivityEngine::phase);
        let moved = self.content.next();
        self.emit_phase_change(before);
        moved
    }

    /// Steps the mounted content back.
    pub fn content_previous(&mut self) -> bool {
        let before = self.content.activity().map(ActivityEngine::phase);
        let moved = self.content.previous();
        self.emit_phase_change(before);
        moved
    }

    fn sync_section(&mut self, previous: Section, remount: bool) {
        let active = self.navigator.active_section();
        if active == previous && !remount {
            return;
        }
        if active != previous {
            self.broadcaster
                .send(LessonEvent::section_changed(previous, active));
        }
        self.panel.dismiss();

        let context = ContentContext {
            lesson_id: self.lesson.id.clone(),
            bus: self.bus.clone(),
            generations: self.generations.clone(),
        };
        self.content = self.lesson.mount(active, &context);
        debug!(section = %active, kind = ?self.content.kind(), "Content mounted");
    }

    fn emit_phase_change(&self, before: Option<crate::Phase>) {
        let after = self.content.activity().map(ActivityEngine::phase);
        if let (Some(before), Some(after)) = (before, after) {
            if before != after {
                self.broadcaster
                    .send(LessonEvent::phase_changed(before, after));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Activity
    // ------------------------------------------------------------------------

    /// Runs `f` against the mounted activity engine, then re-checks content
    /// completion and reports any phase change.
    ///
    /// Returns `None` when no activity is mounted.
    fn with_activity<R>(&mut self, f: impl FnOnce(&mut ActivityEngine) -> R) -> Option<R> {
        let Some(engine) = self.content.activity_mut() else {
            debug!(section = %self.navigator.active_section(), "No activity mounted");
            return None;
        };
        let before = engine.phase();
        let result = f(engine);

        self.content.poll_completion();
        self.emit_phase_change(Some(before));
        Some(result)
    }

    /// Selects a character. Returns `Ok(false)` when no activity is mounted.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::CharacterNotFound` for an unknown character.
    pub fn select_character(&mut self, name: &str) -> Result<bool> {
        match self.with_activity(|engine| engine.select_character(name).map(|_| ())) {
            None => Ok(false),
            Some(result) => {
                result?;
                self.panel.dismiss();
                Ok(true)
            }
        }
    }

    /// Records a response for `question_id`.
    pub fn record_response(&mut self, question_id: &str, text: &str) -> bool {
        self.with_activity(|engine| engine.record_response(question_id, text))
            .is_some()
    }

    /// Moves the activity forward one phase.
    ///
    /// A move blocked by unanswered questions raises a notice.
    pub fn advance_phase(&mut self) -> bool {
        let Some((moved, missing)) = self.with_activity(|engine| {
            let phase = engine.phase();
            let moved = engine.advance();
            let missing = if moved {
                Vec::new()
            } else {
                engine.missing_questions(phase)
            };
            (moved, missing)
        }) else {
            return false;
        };

        if !missing.is_empty() {
            debug!(?missing, "Phase advance blocked by unanswered questions");
            self.raise_notice(NoticeKind::IncompleteQuestions, INCOMPLETE_QUESTIONS_NOTICE);
        }
        moved
    }

    /// Moves the activity back one phase.
    pub fn retreat_phase(&mut self) -> bool {
        self.with_activity(ActivityEngine::retreat).unwrap_or(false)
    }

    /// Skips the feedback phase.
    pub fn skip_feedback(&mut self) -> bool {
        self.with_activity(ActivityEngine::skip).unwrap_or(false)
    }

    /// Submits feedback and moves on.
    pub fn submit_feedback(&mut self, text: &str) -> bool {
        self.with_activity(|engine| engine.submit_feedback(text))
            .unwrap_or(false)
    }

    /// Sends a chat message to the selected character.
    pub fn chat(&mut self, message: &str) -> Option<String> {
        self.with_activity(|engine| engine.chat(message)).flatten()
    }

    /// Answers a quiz question. Returns whether the choice was correct.
    pub fn answer_quiz(&mut self, question_id: &str, choice: usize) -> Option<bool> {
        self.with_activity(|engine| engine.answer_quiz(question_id, choice))
            .flatten()
    }

    // ------------------------------------------------------------------------
    // Suggestions
    // ------------------------------------------------------------------------

    /// Opens the suggestion panel for `question_id` and returns the ticket
    /// and context for the request.
    ///
    /// Returns `None` without a mounted activity, without a selected
    /// character, or for an unknown question.
    pub fn prepare_suggestions(
        &mut self,
        question_id: &str,
    ) -> Option<(SuggestionTicket, SuggestionContext)> {
        let engine = self.content.activity()?;
        let context = engine.suggestion_context(question_id)?;
        let generation = engine.generation();
        let ticket = self.panel.open(question_id, generation);
        Some((ticket, context))
    }

    /// Delivers the result of a suggestion request.
    ///
    /// Results for a question that is no longer open, or for a previous
    /// character, are discarded. Fallback results raise a notice.
    pub fn resolve_suggestions(
        &mut self,
        ticket: &SuggestionTicket,
        outcome: SuggestionOutcome,
    ) -> bool {
        let Some(generation) = self.content.activity().map(ActivityEngine::generation) else {
            debug!(question = %ticket.question_id, "Activity unmounted; discarding suggestions");
            return false;
        };

        let notice = outcome.notice();
        if !self.panel.resolve(ticket, generation, outcome) {
            return false;
        }
        if let Some(message) = notice {
            self.raise_notice(NoticeKind::SuggestionFallback, message);
        }
        true
    }

    /// Closes the suggestion panel.
    pub fn dismiss_suggestions(&mut self) {
        self.panel.dismiss();
    }

    // ------------------------------------------------------------------------
    // Notices
    // ------------------------------------------------------------------------

    fn raise_notice(&mut self, kind: NoticeKind, message: &str) {
        let notice = self.notices.push(kind, message);
        self.broadcaster.send(LessonEvent::Notice(notice));
    }

    /// Dismisses a notice by identifier.
    pub fn dismiss_notice(&mut self, id: u64) -> bool {
        self.notices.dismiss(id)
    }

    /// Returns notices that have not expired.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.active()
    }

    /// Returns a serializable view of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.navigator.state();
        SessionSnapshot {
            lesson_id: self.lesson.id.clone(),
            lesson_title: self.lesson.title.clone(),
            section: state.active,
            at_section_end: state.at_section_end,
            can_continue: state.can_continue(),
            lesson_complete: state.lesson_complete,
            content: self.content.kind(),
            progress: self.content.progress(),
            activity: self.content.activity().map(ActivityEngine::snapshot),
            suggestions: self.panel.snapshot(),
            notices: self.notices.active(),
        }
    }
}
