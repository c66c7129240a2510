//! Lesson Viewer Core
//!
//! Progression logic for an interactive curriculum viewer. A lesson is four
//! sections (introduction, tutorial, activity, code) walked in order by the
//! [`LessonNavigator`]. Mounted section content reports that it has been
//! exhausted by publishing a [`CompletionSignal`] on the [`SignalBus`]; the
//! navigator listens and unlocks the continue control.
//!
//! The activity section hosts the character-training [`ActivityEngine`], a
//! phase machine whose forward moves are guarded by the predicates in
//! [`gate`]. Help text for training questions comes from the
//! `lesson-suggest` pipeline through the [`SuggestionPanel`].
//!
//! [`LessonSession`] wires one of each together, and [`create_router`]
//! serves it over HTTP with a WebSocket event stream.

pub mod api;
pub mod character;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod events;
pub mod gate;
pub mod navigator;
pub mod notice;
pub mod panel;
pub mod phase;
pub mod questions;
pub mod registry;
pub mod responses;
pub mod section;
pub mod session;
pub mod signal;
pub mod websocket;

pub use api::{create_router, ActionResponse, ApiError, AppState, ErrorResponse};
pub use character::{find_character, roster, Character};
pub use config::{Config, CONFIG_FILE_NAME};
pub use content::{
    CodeSample, CompletionNotifier, ContentContext, ContentKind, ContentProgress, Page,
    PagedContent, SectionContent, TrainingActivity,
};
pub use engine::{ActivityEngine, ActivitySnapshot, ChatExchange, GenerationSource};
pub use error::{LessonError, Result, RETURN_TO_LESSON_LIST};
pub use events::{EventBroadcaster, LessonEvent};
pub use navigator::{LessonNavigator, NavigatorState};
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use panel::{PanelSnapshot, SuggestionPanel, SuggestionTicket};
pub use phase::Phase;
pub use questions::{Question, QuestionSet, QuizQuestion};
pub use registry::{LessonDefinition, LessonRegistry, LessonSummary, SectionFactories, SectionFactory};
pub use responses::TrainingResponses;
pub use section::Section;
pub use session::{LessonSession, SessionSnapshot};
pub use signal::{CompletionSignal, SignalBus, Subscription, SECTION_END_EVENT};
