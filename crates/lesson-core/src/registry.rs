//! Lesson registry: lesson identifier to section factories.
//!
//! Each lesson is looked up once on load. The session then asks the
//! definition for the factory of whichever section becomes active.

use serde::{Deserialize, Serialize};

use crate::content::{CodeSample, ContentContext, Page, PagedContent, SectionContent, TrainingActivity};
use crate::error::{LessonError, Result};
use crate::section::Section;

/// Builds the content for one section.
pub type SectionFactory = fn(&ContentContext) -> Box<dyn SectionContent>;

/// One factory per section.
#[derive(Debug, Clone, Copy)]
pub struct SectionFactories {
    /// Builds the introduction.
    pub introduction: SectionFactory,
    /// Builds the tutorial.
    pub tutorial: SectionFactory,
    /// Builds the activity.
    pub activity: SectionFactory,
    /// Builds the code sample.
    pub code: SectionFactory,
}

impl SectionFactories {
    /// Returns the factory for `section`.
    #[must_use]
    pub fn get(&self, section: Section) -> SectionFactory {
        match section {
            Section::Introduction => self.introduction,
            Section::Tutorial => self.tutorial,
            Section::Activity => self.activity,
            Section::Code => self.code,
        }
    }
}

/// A registered lesson.
#[derive(Debug, Clone)]
pub struct LessonDefinition {
    /// Stable identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// One-line description.
    pub summary: String,
    /// Content factories.
    pub sections: SectionFactories,
}

impl LessonDefinition {
    /// Mounts the content for `section`.
    #[must_use]
    pub fn mount(&self, section: Section, context: &ContentContext) -> Box<dyn SectionContent> {
        let mut content = (self.sections.get(section))(context);
        content.poll_completion();
        content
    }
}

/// Listing entry for a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
    /// Stable identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// One-line description.
    pub summary: String,
}

/// All known lessons.
#[derive(Debug, Clone, Default)]
pub struct LessonRegistry {
    lessons: Vec<LessonDefinition>,
}

impl LessonRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in lessons.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(LessonDefinition {
            id: "train-a-character".to_string(),
            title: "Train a Character".to_string(),
            summary: "Teach an AI to talk like your favourite character.".to_string(),
            sections: SectionFactories {
                introduction: training_introduction,
                tutorial: training_tutorial,
                activity: training_activity,
                code: training_code,
            },
        });
        registry.register(LessonDefinition {
            id: "what-is-ai".to_string(),
            title: "What Is AI?".to_string(),
            summary: "Find out how computers learn from examples.".to_string(),
            sections: SectionFactories {
                introduction: ai_introduction,
                tutorial: ai_tutorial,
                activity: ai_activity,
                code: ai_code,
            },
        });
        registry
    }

    /// Adds a lesson, replacing any lesson with the same identifier.
    pub fn register(&mut self, lesson: LessonDefinition) {
        self.lessons.retain(|l| l.id != lesson.id);
        self.lessons.push(lesson);
    }

    /// Looks up a lesson.
    pub fn get(&self, id: &str) -> Result<&LessonDefinition> {
        self.lessons
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| LessonError::lesson_not_found(id))
    }

    /// Returns `true` if a lesson with `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.lessons.iter().any(|l| l.id == id)
    }

    /// Lists lessons in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<LessonSummary> {
        self.lessons
            .iter()
            .map(|l| LessonSummary {
                id: l.id.clone(),
                title: l.title.clone(),
                summary: l.summary.clone(),
            })
            .collect()
    }
}

fn training_introduction(ctx: &ContentContext) -> Box<dyn SectionContent> {
    Box::new(PagedContent::new(
        ctx,
        Section::Introduction,
        vec![
            Page::new(
                "Meet the characters",
                "Chatbots can be taught to talk in different ways.",
            ),
            Page::new(
                "Your mission",
                "Pick a character and teach the AI to sound just like them.",
            ),
        ],
    ))
}

fn training_tutorial(ctx: &ContentContext) -> Box<dyn SectionContent> {
    Box::new(PagedContent::new(
        ctx,
        Section::Tutorial,
        vec![
            Page::new("Examples", "An AI learns from the examples you give it."),
            Page::new("Practice", "The more examples, the better it gets."),
            Page::new("Get help", "Stuck? Ask for suggestions at any time."),
        ],
    ))
}

fn training_activity(ctx: &ContentContext) -> Box<dyn SectionContent> {
    Box::new(TrainingActivity::new(ctx))
}

fn training_code(ctx: &ContentContext) -> Box<dyn SectionContent> {
    Box::new(CodeSample::new(
        ctx,
        "examples = {\"greeting\": \"Hi, I'm Harry!\"}\nprint(examples[\"greeting\"])",
        "Hi, I'm Harry!",
    ))
}

fn ai_introduction(ctx: &ContentContext) -> Box<dyn SectionContent> {
    Box::new(PagedContent::new(
        ctx,
        Section::Introduction,
        vec![Page::new(
            "What is AI?",
            "AI is a computer program that learns patterns from examples.",
        )],
    ))
}

fn ai_tutorial(ctx: &ContentContext) -> Box<dyn SectionContent> {
    Box::new(PagedContent::new(
        ctx,
        Section::Tutorial,
        vec![
            Page::new("Patterns", "Cats have whiskers, dogs bark."),
            Page::new("Learning", "Show enough examples and the computer spots the pattern."),
        ],
    ))
}

fn ai_activity(ctx: &ContentContext) -> Box<dyn SectionContent> {
    Box::new(PagedContent::new(
        ctx,
        Section::Activity,
        vec![
            Page::new("Sort it", "Is a penguin a bird or a fish?"),
            Page::new("Sort it again", "Is a bat a bird or a mammal?"),
        ],
    ))
}

fn ai_code(ctx: &ContentContext) -> Box<dyn SectionContent> {
    Box::new(CodeSample::new(
        ctx,
        "animal = \"penguin\"\nprint(animal, \"is a bird\")",
        "penguin is a bird",
    ))
}
