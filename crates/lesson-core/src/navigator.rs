//! The Lesson Navigator: top-level state machine over lesson sections.
//!
//! The navigator subscribes to the [`SignalBus`] on construction. A
//! completion signal for the active section sets the "at section end" flag,
//! which unlocks the continue control but does not navigate by itself.
//! [`LessonNavigator::complete_content`] is the one path that both signals
//! and moves the section pointer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::gate;
use crate::section::Section;
use crate::signal::{CompletionSignal, SignalBus, Subscription};

/// Observable navigator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigatorState {
    /// The active section.
    pub active: Section,
    /// Whether the active section's content has been exhausted.
    pub at_section_end: bool,
    /// Set once the end of `code` is reached.
    pub lesson_complete: bool,
}

impl NavigatorState {
    /// Returns `true` if the continue control should be enabled.
    #[must_use]
    pub const fn can_continue(&self) -> bool {
        gate::section_may_advance(self.active, self.at_section_end)
    }
}

/// Tracks the active section for one lesson session.
#[derive(Debug)]
pub struct LessonNavigator {
    state: Arc<Mutex<NavigatorState>>,
    bus: SignalBus,
    _subscription: Subscription,
}

impl LessonNavigator {
    /// Creates a navigator at `introduction`, subscribed to `bus`.
    #[must_use]
    pub fn new(bus: &SignalBus) -> Self {
        let state = Arc::new(Mutex::new(NavigatorState::default()));

        let shared = Arc::clone(&state);
        let subscription = bus.subscribe(move |signal| {
            apply_signal(&mut lock(&shared), signal);
        });

        Self {
            state,
            bus: bus.clone(),
            _subscription: subscription,
        }
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn state(&self) -> NavigatorState {
        *lock(&self.state)
    }

    /// Returns the active section.
    #[must_use]
    pub fn active_section(&self) -> Section {
        self.state().active
    }

    /// Returns `true` if the active section has signalled its end.
    #[must_use]
    pub fn is_at_section_end(&self) -> bool {
        self.state().at_section_end
    }

    /// Returns `true` once the lesson has been completed.
    #[must_use]
    pub fn is_lesson_complete(&self) -> bool {
        self.state().lesson_complete
    }

    /// Makes `section` active. Unconditional; always clears the end flag.
    pub fn set_active_section(&self, section: Section) {
        let mut state = lock(&self.state);
        if state.active != section {
            info!(from = %state.active, to = %section, "Section changed");
        }
        state.active = section;
        state.at_section_end = false;
    }

    /// Makes the named section active. Unknown names are rejected as a no-op.
    pub fn set_active_section_by_name(&self, name: &str) -> bool {
        match name.parse::<Section>() {
            Ok(section) => {
                self.set_active_section(section);
                true
            }
            Err(e) => {
                warn!(name, error = %e, "Ignoring unknown section");
                false
            }
        }
    }

    /// Moves to the next section if the section gate passes.
    pub fn advance(&self) -> bool {
        let state = self.state();
        if !state.can_continue() {
            debug!(section = %state.active, at_end = state.at_section_end, "Continue blocked");
            return false;
        }
        match state.active.next() {
            Some(next) => {
                self.set_active_section(next);
                true
            }
            None => false,
        }
    }

    /// Moves to the previous section. Never validates.
    pub fn back(&self) -> bool {
        match self.active_section().previous() {
            Some(previous) => {
                self.set_active_section(previous);
                true
            }
            None => false,
        }
    }

    /// Signals completion of the active section and moves past it directly.
    ///
    /// At `code` there is nowhere to move; the lesson is marked complete.
    /// Returns `true` if the section pointer moved.
    pub fn complete_content(&self) -> bool {
        let section = self.active_section();
        self.bus.publish(&CompletionSignal::for_section(section));

        match section.next() {
            Some(next) => {
                self.set_active_section(next);
                true
            }
            None => {
                lock(&self.state).lesson_complete = true;
                false
            }
        }
    }

    /// Returns to `introduction` with a clear state for a new lesson.
    pub fn reset(&self) {
        *lock(&self.state) = NavigatorState::default();
        debug!("Navigator reset");
    }
}

fn apply_signal(state: &mut NavigatorState, signal: &CompletionSignal) {
    if !signal.applies_to(state.active) {
        debug!(
            active = %state.active,
            signal_section = ?signal.section_id,
            "Ignoring completion signal for inactive section"
        );
        return;
    }

    state.at_section_end = signal.is_at_end;
    if signal.is_at_end && state.active.is_last() && !state.lesson_complete {
        state.lesson_complete = true;
        info!("Lesson complete");
    }
}

fn lock(state: &Mutex<NavigatorState>) -> MutexGuard<'_, NavigatorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
