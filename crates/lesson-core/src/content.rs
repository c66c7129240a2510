//! Leaf content mounted inside a lesson section.
//!
//! Every piece of content owns a [`CompletionNotifier`], its `onComplete`
//! callback. The notifier fires at most once per mounted instance and
//! publishes a [`CompletionSignal`] on the shared bus, so the navigator
//! learns about it without holding a reference to the content.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::{ActivityEngine, GenerationSource};
use crate::section::Section;
use crate::signal::{CompletionSignal, SignalBus};

/// What kind of content is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    /// A sequence of reading pages.
    Pages,
    /// A runnable code sample.
    CodeSample,
    /// The character-training activity.
    Training,
}

/// Position within a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentProgress {
    /// Zero-based step index.
    pub position: usize,
    /// Number of steps.
    pub total: usize,
    /// Whether completion has been reported.
    pub finished: bool,
}

/// Fires the `onComplete` contract exactly once.
pub struct CompletionNotifier {
    bus: SignalBus,
    section: Section,
    fired: bool,
}

impl CompletionNotifier {
    /// Creates an unfired notifier for `section`.
    #[must_use]
    pub const fn new(bus: SignalBus, section: Section) -> Self {
        Self {
            bus,
            section,
            fired: false,
        }
    }

    /// Publishes the completion signal. Later calls do nothing.
    ///
    /// Returns `true` only on the call that fired.
    pub fn notify(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        info!(section = %self.section, "Section content complete");
        self.bus.publish(&CompletionSignal::for_section(self.section));
        true
    }

    /// Returns `true` once [`notify`](Self::notify) has fired.
    #[must_use]
    pub const fn has_fired(&self) -> bool {
        self.fired
    }
}

impl fmt::Debug for CompletionNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionNotifier")
            .field("section", &self.section)
            .field("fired", &self.fired)
            .finish_non_exhaustive()
    }
}

/// What a section factory receives when content is mounted.
#[derive(Debug, Clone)]
pub struct ContentContext {
    /// The lesson being shown.
    pub lesson_id: String,
    /// The session's signal bus.
    pub bus: SignalBus,
    /// Character generation tokens shared by every activity mount.
    pub generations: GenerationSource,
}

impl ContentContext {
    /// Creates a notifier bound to this context's bus.
    #[must_use]
    pub fn notifier(&self, section: Section) -> CompletionNotifier {
        CompletionNotifier::new(self.bus.clone(), section)
    }
}

/// The contract every mounted section content satisfies.
pub trait SectionContent: Send + fmt::Debug {
    /// The section this content belongs to.
    fn section(&self) -> Section;

    /// The kind of content.
    fn kind(&self) -> ContentKind;

    /// Current position.
    fn progress(&self) -> ContentProgress;

    /// Steps forward. Returns `false` if nothing changed.
    fn next(&mut self) -> bool;

    /// Steps back. Returns `false` if nothing changed.
    fn previous(&mut self) -> bool;

    /// Re-checks completion and fires the notifier if it is now due.
    ///
    /// Called after mounting and after every external mutation.
    fn poll_completion(&mut self);

    /// Returns `true` once completion has been reported.
    fn is_finished(&self) -> bool {
        self.progress().finished
    }

    /// The embedded activity engine, for content that has one.
    fn activity(&self) -> Option<&ActivityEngine> {
        None
    }

    /// Mutable access to the embedded activity engine.
    fn activity_mut(&mut self) -> Option<&mut ActivityEngine> {
        None
    }
}

/// A titled page of reading material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Heading.
    pub title: String,
    /// Body text.
    pub body: String,
}

impl Page {
    /// Creates a page.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Pages read in order. Reaching the last page completes the section.
#[derive(Debug)]
pub struct PagedContent {
    section: Section,
    pages: Vec<Page>,
    index: usize,
    notifier: CompletionNotifier,
}

impl PagedContent {
    /// Creates paged content for `section`.
    #[must_use]
    pub fn new(context: &ContentContext, section: Section, pages: Vec<Page>) -> Self {
        Self {
            section,
            pages,
            index: 0,
            notifier: context.notifier(section),
        }
    }

    /// Returns the page currently shown.
    #[must_use]
    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.index)
    }
}

impl SectionContent for PagedContent {
    fn section(&self) -> Section {
        self.section
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Pages
    }

    fn progress(&self) -> ContentProgress {
        ContentProgress {
            position: self.index,
            total: self.pages.len(),
            finished: self.notifier.has_fired(),
        }
    }

    fn next(&mut self) -> bool {
        if self.index + 1 >= self.pages.len() {
            return false;
        }
        self.index += 1;
        self.poll_completion();
        true
    }

    fn previous(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    fn poll_completion(&mut self) {
        if self.index + 1 >= self.pages.len() {
            self.notifier.notify();
        }
    }
}

/// A code sample the learner runs once.
#[derive(Debug)]
pub struct CodeSample {
    /// Source text shown to the learner.
    pub source: String,
    /// Output shown after running.
    pub output: String,
    ran: bool,
    notifier: CompletionNotifier,
}

impl CodeSample {
    /// Creates a code sample for the `code` section.
    #[must_use]
    pub fn new(context: &ContentContext, source: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            ran: false,
            notifier: context.notifier(Section::Code),
        }
    }
}

impl SectionContent for CodeSample {
    fn section(&self) -> Section {
        Section::Code
    }

    fn kind(&self) -> ContentKind {
        ContentKind::CodeSample
    }

    fn progress(&self) -> ContentProgress {
        ContentProgress {
            position: usize::from(self.ran),
            total: 1,
            finished: self.notifier.has_fired(),
        }
    }

    /// Runs the sample.
    fn next(&mut self) -> bool {
        if self.ran {
            return false;
        }
        self.ran = true;
        debug!("Code sample run");
        self.poll_completion();
        true
    }

    fn previous(&mut self) -> bool {
        false
    }

    fn poll_completion(&mut self) {
        if self.ran {
            self.notifier.notify();
        }
    }
}

/// The character-training activity. Completes when the quiz is answered.
#[derive(Debug)]
pub struct TrainingActivity {
    engine: ActivityEngine,
    notifier: CompletionNotifier,
}

impl TrainingActivity {
    /// Creates a fresh activity for the `activity` section.
    #[must_use]
    pub fn new(context: &ContentContext) -> Self {
        Self {
            engine: ActivityEngine::with_generations(context.generations.clone()),
            notifier: context.notifier(Section::Activity),
        }
    }
}

impl SectionContent for TrainingActivity {
    fn section(&self) -> Section {
        Section::Activity
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Training
    }

    fn progress(&self) -> ContentProgress {
        let phase = self.engine.phase();
        ContentProgress {
            position: crate::Phase::ALL
                .iter()
                .position(|p| *p == phase)
                .unwrap_or_default(),
            total: crate::Phase::ALL.len(),
            finished: self.notifier.has_fired(),
        }
    }

    fn next(&mut self) -> bool {
        let moved = self.engine.advance();
        self.poll_completion();
        moved
    }

    fn previous(&mut self) -> bool {
        self.engine.retreat()
    }

    fn poll_completion(&mut self) {
        if self.engine.is_quiz_complete() {
            self.notifier.notify();
        }
    }

    fn activity(&self) -> Option<&ActivityEngine> {
        Some(&self.engine)
    }

    fn activity_mut(&mut self) -> Option<&mut ActivityEngine> {
        Some(&mut self.engine)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recording_context() -> (ContentContext, Arc<Mutex<Vec<CompletionSignal>>>, crate::Subscription) {
        let bus = SignalBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = bus.subscribe(move |signal| sink.lock().unwrap().push(signal.clone()));
        let context = ContentContext {
            lesson_id: "test".to_string(),
            bus,
            generations: GenerationSource::new(),
        };
        (context, seen, subscription)
    }

    #[test]
    fn test_notifier_fires_once() {
        let (context, seen, _sub) = recording_context();
        let mut notifier = context.notifier(Section::Tutorial);

        assert!(notifier.notify());
        assert!(!notifier.notify());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![CompletionSignal::for_section(Section::Tutorial)]
        );
    }

    #[test]
    fn test_pages_complete_on_last_page() {
        let (context, seen, _sub) = recording_context();
        let mut content = PagedContent::new(
            &context,
            Section::Introduction,
            vec![Page::new("One", "a"), Page::new("Two", "b"), Page::new("Three", "c")],
        );
        content.poll_completion();
        assert!(!content.is_finished());

        assert!(content.next());
        assert!(content.next());
        assert!(!content.next());
        assert!(content.is_finished());
        assert_eq!(content.current_page().unwrap().title, "Three");

        // Going back and forward again does not re-fire.
        assert!(content.previous());
        assert!(content.next());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_single_page_completes_on_mount() {
        let (context, seen, _sub) = recording_context();
        let mut content = PagedContent::new(&context, Section::Tutorial, vec![Page::new("Only", "x")]);
        content.poll_completion();
        assert!(content.is_finished());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_code_sample_completes_when_run() {
        let (context, seen, _sub) = recording_context();
        let mut sample = CodeSample::new(&context, "print('hi')", "hi");
        assert_eq!(sample.progress().position, 0);
        assert!(sample.next());
        assert!(!sample.next());
        assert!(sample.is_finished());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![CompletionSignal::for_section(Section::Code)]
        );
    }

    #[test]
    fn test_training_activity_completes_after_quiz() {
        let (context, seen, _sub) = recording_context();
        let mut activity = TrainingActivity::new(&context);
        assert_eq!(activity.kind(), ContentKind::Training);

        let engine = activity.activity_mut().unwrap();
        engine.select_character("sherlock-holmes").unwrap();
        for q in crate::questions::questions(crate::questions::QuestionSet::Basic)
            .chain(crate::questions::questions(crate::questions::QuestionSet::Advanced))
        {
            engine.record_response(q.id, "Elementary.");
        }
        while activity.next() {}
        assert_eq!(activity.activity().unwrap().phase(), crate::Phase::Quiz);
        assert!(!activity.is_finished());

        let engine = activity.activity_mut().unwrap();
        for q in crate::questions::quiz() {
            engine.answer_quiz(q.id, 0).unwrap();
        }
        activity.poll_completion();
        assert!(activity.is_finished());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
