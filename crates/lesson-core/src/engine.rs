//! The Activity Phase Engine for the character-training activity.
//!
//! Forward moves are guarded by [`gate::phase_complete`]; a failed gate
//! leaves the engine untouched and returns `false` so callers can show a
//! "please complete all questions" notice. Backward moves never re-validate.
//!
//! Switching characters clears the responses, returns to `pre-training` and
//! bumps [`ActivityEngine::generation`], which callers use to drop results
//! of suggestion requests issued for the previous character. Engines mounted
//! in one session share a [`GenerationSource`], so a token is never reused
//! after the activity is remounted.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lesson_suggest::SuggestionContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::character::{self, Character};
use crate::error::{LessonError, Result};
use crate::gate::{self, GateInputs};
use crate::phase::Phase;
use crate::questions;
use crate::responses::TrainingResponses;

/// One chat message and the character's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExchange {
    /// Phase the exchange happened in.
    pub phase: Phase,
    /// What the learner typed.
    pub message: String,
    /// What the character answered.
    pub reply: String,
}

/// Serializable view of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    /// Current phase.
    pub phase: Phase,
    /// Selected character identifier.
    pub character: Option<String>,
    /// Bumped on every character switch.
    pub generation: u64,
    /// Learner responses.
    pub responses: TrainingResponses,
    /// Submitted feedback, if any.
    pub feedback: Option<String>,
    /// Quiz answers by question identifier.
    pub quiz_answers: BTreeMap<String, usize>,
    /// Whether the current phase's gate passes.
    pub can_advance: bool,
    /// Unanswered questions in the current phase.
    pub missing_questions: Vec<String>,
    /// Chat history for the current character.
    pub transcript: Vec<ChatExchange>,
}

/// Monotonic source of character generation tokens.
#[derive(Debug, Clone, Default)]
pub struct GenerationSource(Arc<AtomicU64>);

impl GenerationSource {
    /// Creates a source whose first token is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token greater than every token issued before.
    pub fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Ordered state machine over [`Phase`]s.
#[derive(Debug, Clone, Default)]
pub struct ActivityEngine {
    phase: Phase,
    character: Option<&'static Character>,
    generation: u64,
    generations: GenerationSource,
    responses: TrainingResponses,
    feedback: Option<String>,
    quiz_answers: BTreeMap<String, usize>,
    transcript: Vec<ChatExchange>,
}

impl ActivityEngine {
    /// Creates an engine at `selection` with no character and its own
    /// generation source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine drawing generation tokens from a shared source.
    ///
    /// The engine takes a fresh token immediately, so tickets issued by an
    /// earlier engine on the same source never match this one.
    #[must_use]
    pub fn with_generations(generations: GenerationSource) -> Self {
        Self {
            generation: generations.issue(),
            generations,
            ..Self::default()
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the selected character.
    #[must_use]
    pub const fn character(&self) -> Option<&'static Character> {
        self.character
    }

    /// Returns the character generation token.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the learner's responses.
    #[must_use]
    pub const fn responses(&self) -> &TrainingResponses {
        &self.responses
    }

    /// Returns the chat transcript.
    #[must_use]
    pub fn transcript(&self) -> &[ChatExchange] {
        &self.transcript
    }

    /// Selects a character by name or identifier.
    ///
    /// Resets responses, feedback, quiz answers and the transcript, bumps
    /// the generation token and moves to `pre-training`. Reselecting the
    /// current character also resets.
    pub fn select_character(&mut self, name: &str) -> Result<&'static Character> {
        let character =
            character::find_character(name).ok_or_else(|| LessonError::character_not_found(name))?;

        self.character = Some(character);
        self.generation = self.generations.issue();
        self.responses.clear();
        self.feedback = None;
        self.quiz_answers.clear();
        self.transcript.clear();
        self.phase = Phase::PreTraining;

        info!(
            character = character.id,
            generation = self.generation,
            "Character selected"
        );
        Ok(character)
    }

    /// Upserts a response. Never validated at write time.
    pub fn record_response(&mut self, question_id: impl Into<String>, text: impl Into<String>) {
        let question_id = question_id.into();
        debug!(question = %question_id, "Response recorded");
        self.responses.record(question_id, text);
    }

    /// Returns `true` if the gate for `phase` passes against current state.
    #[must_use]
    pub fn is_phase_complete(&self, phase: Phase) -> bool {
        gate::phase_complete(phase, &self.gate_inputs())
    }

    /// Moves forward one phase if the current phase's gate passes.
    pub fn advance(&mut self) -> bool {
        if !self.is_phase_complete(self.phase) {
            debug!(phase = %self.phase, "Advance blocked by gate");
            return false;
        }
        let Some(next) = self.phase.next() else {
            debug!(phase = %self.phase, "Already at final phase");
            return false;
        };
        self.move_to(next);
        true
    }

    /// Moves back one phase. Never validates.
    pub fn retreat(&mut self) -> bool {
        match self.phase.previous() {
            Some(previous) => {
                self.move_to(previous);
                true
            }
            None => false,
        }
    }

    /// Skips from `feedback` to `advanced`. A no-op in any other phase.
    pub fn skip(&mut self) -> bool {
        if self.phase != Phase::Feedback {
            debug!(phase = %self.phase, "Skip is only available during feedback");
            return false;
        }
        self.move_to(Phase::Advanced);
        true
    }

    /// Stores feedback and moves on to `advanced`.
    ///
    /// Only applies during `feedback`, and only for non-blank text; use
    /// [`skip`](Self::skip) to move on without feedback.
    pub fn submit_feedback(&mut self, text: &str) -> bool {
        if self.phase != Phase::Feedback || text.trim().is_empty() {
            debug!(phase = %self.phase, "Feedback ignored");
            return false;
        }
        self.feedback = Some(text.trim().to_string());
        self.move_to(Phase::Advanced);
        true
    }

    /// Replies to a chat message.
    ///
    /// In `pre-training` the reply comes from the character's canned table.
    /// In `practice` it comes from the trained set, where the learner's
    /// responses take precedence over canned replies. Returns `None` when no
    /// character is selected or the phase has no chat.
    pub fn chat(&mut self, message: &str) -> Option<String> {
        let character = self.character?;
        if !self.phase.allows_chat() {
            debug!(phase = %self.phase, "Chat is not available in this phase");
            return None;
        }

        let reply = if self.phase == Phase::Practice {
            self.trained_reply(character, message)
        } else {
            character.canned_reply(message).to_string()
        };

        self.transcript.push(ChatExchange {
            phase: self.phase,
            message: message.to_string(),
            reply: reply.clone(),
        });
        Some(reply)
    }

    /// Canned replies merged with learner responses, keyed by topic.
    #[must_use]
    pub fn trained_set(&self) -> BTreeMap<String, String> {
        let mut set: BTreeMap<String, String> = self
            .character
            .map(|c| c.canned)
            .unwrap_or_default()
            .iter()
            .map(|(topic, reply)| ((*topic).to_string(), (*reply).to_string()))
            .collect();

        for (question_id, text) in self.responses.answered() {
            set.insert(question_id.to_string(), text.trim().to_string());
        }
        set
    }

    fn trained_reply(&self, character: &Character, message: &str) -> String {
        questions::match_topic(message)
            .and_then(|topic| self.trained_set().remove(topic))
            .unwrap_or_else(|| character.default_reply.to_string())
    }

    /// Records a quiz answer and returns whether it was correct.
    ///
    /// Returns `None` outside the `quiz` phase or for an unknown question or
    /// choice.
    pub fn answer_quiz(&mut self, question_id: &str, choice: usize) -> Option<bool> {
        if self.phase != Phase::Quiz {
            debug!(phase = %self.phase, "Quiz answers are only accepted during the quiz");
            return None;
        }
        let correct = questions::quiz_question(question_id)?.check(choice)?;
        self.quiz_answers.insert(question_id.to_string(), choice);
        info!(question = question_id, correct, "Quiz answered");
        Some(correct)
    }

    /// Returns `true` once the quiz phase is reached and fully answered.
    #[must_use]
    pub fn is_quiz_complete(&self) -> bool {
        self.phase == Phase::Quiz && gate::quiz_answered(&self.quiz_answers)
    }

    /// Lists unanswered questions for `phase`; empty for ungated phases.
    #[must_use]
    pub fn missing_questions(&self, phase: Phase) -> Vec<&'static str> {
        phase
            .question_set()
            .map(|set| gate::missing_questions(set, &self.responses))
            .unwrap_or_default()
    }

    /// Builds the context for a suggestion request on `question_id`.
    ///
    /// Returns `None` without a selected character or for an unknown question.
    #[must_use]
    pub fn suggestion_context(&self, question_id: &str) -> Option<SuggestionContext> {
        let character = self.character?;
        let question = questions::question(question_id)?;

        let mut context = SuggestionContext::new(character.id, character.name, question.id)
            .with_question(question.prompt_for(character.name))
            .with_traits(character.traits.iter().copied());
        if let Some(attempt) = self.responses.get(question_id) {
            context = context.with_prior_attempt(attempt);
        }
        Some(context)
    }

    /// Returns a serializable view of the engine.
    #[must_use]
    pub fn snapshot(&self) -> ActivitySnapshot {
        ActivitySnapshot {
            phase: self.phase,
            character: self.character.map(|c| c.id.to_string()),
            generation: self.generation,
            responses: self.responses.clone(),
            feedback: self.feedback.clone(),
            quiz_answers: self.quiz_answers.clone(),
            can_advance: self.phase.next().is_some() && self.is_phase_complete(self.phase),
            missing_questions: self
                .missing_questions(self.phase)
                .into_iter()
                .map(str::to_string)
                .collect(),
            transcript: self.transcript.clone(),
        }
    }

    fn gate_inputs(&self) -> GateInputs<'_> {
        GateInputs {
            character_selected: self.character.is_some(),
            responses: &self.responses,
            quiz_answers: &self.quiz_answers,
        }
    }

    fn move_to(&mut self, phase: Phase) {
        info!(from = %self.phase, to = %phase, "Phase changed");
        self.phase = phase;
    }
}
