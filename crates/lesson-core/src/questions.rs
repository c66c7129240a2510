//! Fixed question sets for the training activity, and the closing quiz.

use serde::{Deserialize, Serialize};

/// Which training phase a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSet {
    /// Guided training questions.
    Basic,
    /// Harder follow-up questions.
    Advanced,
}

/// A training question. The prompt is templated on the character's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    /// Stable identifier; also the topic key for chat replies.
    pub id: &'static str,
    /// The set this question belongs to.
    pub set: QuestionSet,
    template: &'static str,
    /// Lowercase words that route a chat message to this topic.
    pub keywords: &'static [&'static str],
}

impl Question {
    /// Renders the question for a character.
    #[must_use]
    pub fn prompt_for(&self, character_name: &str) -> String {
        self.template.replace("{name}", character_name)
    }
}

static QUESTIONS: [Question; 6] = [
    Question {
        id: "greeting",
        set: QuestionSet::Basic,
        template: "How would {name} say hello to a new friend?",
        keywords: &["hello", "hi", "hey", "greetings", "meet"],
    },
    Question {
        id: "favorite-thing",
        set: QuestionSet::Basic,
        template: "What is {name}'s favorite thing to do?",
        keywords: &["favorite", "favourite", "love", "best", "fun"],
    },
    Question {
        id: "problem-solving",
        set: QuestionSet::Basic,
        template: "How does {name} solve a tricky problem?",
        keywords: &["problem", "solve", "stuck", "fix", "tricky"],
    },
    Question {
        id: "hard-day",
        set: QuestionSet::Advanced,
        template: "What would {name} say to a friend having a hard day?",
        keywords: &["sad", "bad", "tired", "upset", "hard"],
    },
    Question {
        id: "advice",
        set: QuestionSet::Advanced,
        template: "What advice would {name} give to a new student?",
        keywords: &["advice", "should", "tip", "tips"],
    },
    Question {
        id: "secret",
        set: QuestionSet::Advanced,
        template: "What secret might {name} be keeping?",
        keywords: &["secret", "hide", "hiding", "nobody"],
    },
];

/// Returns every question in a set, in display order.
pub fn questions(set: QuestionSet) -> impl Iterator<Item = &'static Question> {
    QUESTIONS.iter().filter(move |q| q.set == set)
}

/// Looks up a question by identifier.
#[must_use]
pub fn question(id: &str) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id == id)
}

/// Routes a chat message to the first topic whose keywords it contains.
#[must_use]
pub fn match_topic(message: &str) -> Option<&'static str> {
    let lowered = message.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect();

    QUESTIONS
        .iter()
        .find(|q| q.keywords.iter().any(|k| words.contains(k)))
        .map(|q| q.id)
}

/// A multiple-choice quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Stable identifier.
    pub id: &'static str,
    /// Question text.
    pub prompt: &'static str,
    /// Available answers.
    pub choices: &'static [&'static str],
    #[serde(skip)]
    correct: usize,
}

impl QuizQuestion {
    /// Returns `Some(correct?)` for a valid choice index.
    #[must_use]
    pub fn check(&self, choice: usize) -> Option<bool> {
        (choice < self.choices.len()).then_some(choice == self.correct)
    }
}

static QUIZ: [QuizQuestion; 3] = [
    QuizQuestion {
        id: "q1",
        prompt: "How did the AI learn to talk like your character?",
        choices: &[
            "It already knew everything",
            "From the example answers you gave it",
            "By reading your mind",
        ],
        correct: 1,
    },
    QuizQuestion {
        id: "q2",
        prompt: "What happens when you ask about something it was never trained on?",
        choices: &[
            "It gives a default answer",
            "It always knows the answer",
            "It stops working forever",
        ],
        correct: 0,
    },
    QuizQuestion {
        id: "q3",
        prompt: "How can you make the AI's answers better?",
        choices: &[
            "Give it fewer examples",
            "Turn it off and on again",
            "Give it more and better examples",
        ],
        correct: 2,
    },
];

/// Returns the quiz questions in order.
#[must_use]
pub fn quiz() -> &'static [QuizQuestion] {
    &QUIZ
}

/// Looks up a quiz question by identifier.
#[must_use]
pub fn quiz_question(id: &str) -> Option<&'static QuizQuestion> {
    QUIZ.iter().find(|q| q.id == id)
}
