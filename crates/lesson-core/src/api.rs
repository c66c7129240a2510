//! HTTP API over a lesson session.
//!
//! # Endpoints
//!
//! - `GET /api/lessons` - List lessons
//! - `GET /api/session` - Session snapshot
//! - `POST /api/session/{lesson,section,continue,back}` - Section navigation
//! - `POST /api/content/{next,previous,complete}` - Step the mounted content
//! - `POST /api/activity/...` - Activity phase engine
//! - `POST /api/activity/suggestions` - Suggestion pipeline via the panel
//! - `POST /api/notices/dismiss` - Dismiss a notice
//! - `GET /ws` - Event stream
//!
//! Mutations answer `{ "applied": bool, "session": {...} }`. A rejected
//! transition is not an error: it answers `applied: false` with the
//! unchanged session.
//!
//! # Example
//!
//! ```no_run
//! use lesson_core::{create_router, AppState, Config};
//!
//! # async fn example() -> lesson_core::Result<()> {
//! let state = AppState::new(Config::default())?;
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lesson_suggest::{HttpTextGenerator, SuggestionOutcome, SuggestionPipeline};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{LessonError, Result};
use crate::events::EventBroadcaster;
use crate::registry::{LessonRegistry, LessonSummary};
use crate::session::{LessonSession, SessionSnapshot};
use crate::websocket::ws_handler;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body for `POST /api/session/lesson`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadLessonRequest {
    /// The lesson to load.
    pub lesson_id: String,
}

/// Body for `POST /api/session/section`.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionRequest {
    /// Section name, e.g. `"activity"`.
    pub section: String,
}

/// Body for `POST /api/activity/character`.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterRequest {
    /// Character name or identifier.
    pub name: String,
}

/// Body for `POST /api/activity/response`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRequest {
    /// The question being answered.
    pub question_id: String,
    /// The learner's answer.
    pub text: String,
}

/// Body for `POST /api/activity/feedback`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    /// Feedback text.
    pub text: String,
}

/// Body for `POST /api/activity/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// What the learner typed.
    pub message: String,
}

/// Body for `POST /api/activity/quiz`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    /// The quiz question.
    pub question_id: String,
    /// Zero-based choice index.
    pub choice: usize,
}

/// Body for `POST /api/activity/suggestions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsRequest {
    /// The question to get help with.
    pub question_id: String,
}

/// Body for `POST /api/notices/dismiss`.
#[derive(Debug, Clone, Deserialize)]
pub struct DismissNoticeRequest {
    /// The notice to dismiss.
    pub id: u64,
}

/// Answer to every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Whether the transition took effect.
    pub applied: bool,
    /// The session after the request.
    pub session: SessionSnapshot,
}

/// Answer to `POST /api/activity/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The character's reply, if chat is available.
    pub reply: Option<String>,
    /// The session after the request.
    pub session: SessionSnapshot,
}

/// Answer to `POST /api/activity/quiz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    /// Whether the choice was correct; `null` if the answer was not accepted.
    pub correct: Option<bool>,
    /// The session after the request.
    pub session: SessionSnapshot,
}

/// Answer to `POST /api/activity/suggestions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    /// Whether the result was still current when it arrived.
    pub applied: bool,
    /// The suggestions produced for the request.
    pub outcome: SuggestionOutcome,
    /// The session after the request.
    pub session: SessionSnapshot,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
    /// The single recovery action to offer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<String>,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Validated configuration.
    pub config: Config,
    /// Known lessons.
    pub registry: Arc<LessonRegistry>,
    /// The learner's session.
    pub session: Arc<Mutex<LessonSession>>,
    /// Event fan-out for WebSocket clients.
    pub broadcaster: EventBroadcaster,
    /// Suggestion pipeline bound to the configured endpoint.
    pub pipeline: Arc<SuggestionPipeline<HttpTextGenerator>>,
}

impl AppState {
    /// Builds the state with the built-in lessons.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or names an unknown
    /// default lesson.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_registry(config, LessonRegistry::builtin())
    }

    /// Builds the state with a custom lesson registry.
    ///
    /// # Errors
    ///
    /// Same as [`AppState::new`].
    pub fn with_registry(config: Config, registry: LessonRegistry) -> Result<Self> {
        config.validate_with(&registry)?;

        let registry = Arc::new(registry);
        let broadcaster = EventBroadcaster::new(config.event_buffer_size);
        let session = LessonSession::new(
            Arc::clone(&registry),
            &config.default_lesson,
            config.notice_ttl(),
            broadcaster.clone(),
        )?;
        let pipeline =
            SuggestionPipeline::from_endpoint(config.suggestion_endpoint.clone(), config.pipeline_config());

        Ok(Self {
            config,
            registry,
            session: Arc::new(Mutex::new(session)),
            broadcaster,
            pipeline: Arc::new(pipeline),
        })
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Error type for API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A lesson or character does not exist.
    NotFound {
        /// What was missing.
        message: String,
        /// Recovery action to offer.
        recovery: Option<&'static str>,
    },
    /// The request cannot be served in the current state.
    BadRequest(String),
}

impl From<LessonError> for ApiError {
    fn from(error: LessonError) -> Self {
        if error.is_not_found() {
            Self::NotFound {
                message: error.to_string(),
                recovery: error.recovery_action(),
            }
        } else {
            Self::BadRequest(error.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound { message, recovery } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: message,
                    recovery: recovery.map(str::to_string),
                },
            ),
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message,
                    recovery: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the router: API routes under `/api` and the event stream at `/ws`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/lessons", get(handle_lessons))
        .route("/session", get(handle_session))
        .route("/session/lesson", post(handle_load_lesson))
        .route("/session/section", post(handle_section))
        .route("/session/continue", post(handle_continue))
        .route("/session/back", post(handle_back))
        .route("/content/next", post(handle_content_next))
        .route("/content/previous", post(handle_content_previous))
        .route("/content/complete", post(handle_content_complete))
        .route("/activity/character", post(handle_character))
        .route("/activity/response", post(handle_response))
        .route("/activity/advance", post(handle_advance))
        .route("/activity/retreat", post(handle_retreat))
        .route("/activity/skip", post(handle_skip))
        .route("/activity/feedback", post(handle_feedback))
        .route("/activity/chat", post(handle_chat))
        .route("/activity/quiz", post(handle_quiz))
        .route("/activity/suggestions", post(handle_suggestions))
        .route("/activity/suggestions/dismiss", post(handle_dismiss_suggestions))
        .route("/notices/dismiss", post(handle_dismiss_notice));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

type AppHandle = State<Arc<AppState>>;

/// Runs a mutation under the session lock and reports the result.
async fn apply(state: &AppState, f: impl FnOnce(&mut LessonSession) -> bool) -> Json<ActionResponse> {
    let mut session = state.session.lock().await;
    let applied = f(&mut session);
    Json(ActionResponse {
        applied,
        session: session.snapshot(),
    })
}

async fn handle_lessons(State(state): AppHandle) -> Json<Vec<LessonSummary>> {
    Json(state.registry.list())
}

async fn handle_session(State(state): AppHandle) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

async fn handle_load_lesson(
    State(state): AppHandle,
    Json(request): Json<LoadLessonRequest>,
) -> std::result::Result<Json<ActionResponse>, ApiError> {
    let mut session = state.session.lock().await;
    session.load_lesson(&request.lesson_id)?;
    info!(lesson = %request.lesson_id, "Lesson loaded over HTTP");
    Ok(Json(ActionResponse {
        applied: true,
        session: session.snapshot(),
    }))
}

async fn handle_section(
    State(state): AppHandle,
    Json(request): Json<SectionRequest>,
) -> Json<ActionResponse> {
    apply(&state, |session| session.set_section(&request.section)).await
}

async fn handle_continue(State(state): AppHandle) -> Json<ActionResponse> {
    apply(&state, LessonSession::continue_section).await
}

async fn handle_back(State(state): AppHandle) -> Json<ActionResponse> {
    apply(&state, LessonSession::back_section).await
}

async fn handle_content_next(State(state): AppHandle) -> Json<ActionResponse> {
    apply(&state, LessonSession::content_next).await
}

async fn handle_content_previous(State(state): AppHandle) -> Json<ActionResponse> {
    apply(&state, LessonSession::content_previous).await
}

async fn handle_content_complete(State(state): AppHandle) -> Json<ActionResponse> {
    apply(&state, LessonSession::complete_section).await
}

async fn handle_character(
    State(state): AppHandle,
    Json(request): Json<CharacterRequest>,
) -> std::result::Result<Json<ActionResponse>, ApiError> {
    let mut session = state.session.lock().await;
    let applied = session.select_character(&request.name)?;
    Ok(Json(ActionResponse {
        applied,
        session: session.snapshot(),
    }))
}

async fn handle_response(
    State(state): AppHandle,
    Json(request): Json<ResponseRequest>,
) -> Json<ActionResponse> {
    apply(&state, |session| {
        session.record_response(&request.question_id, &request.text)
    })
    .await
}

async fn handle_advance(State(state): AppHandle) -> Json<ActionResponse> {
    apply(&state, LessonSession::advance_phase).await
}

async fn handle_retreat(State(state): AppHandle) -> Json<ActionResponse> {
    apply(&state, LessonSession::retreat_phase).await
}

async fn handle_skip(State(state): AppHandle) -> Json<ActionResponse> {
    apply(&state, LessonSession::skip_feedback).await
}

async fn handle_feedback(
    State(state): AppHandle,
    Json(request): Json<FeedbackRequest>,
) -> Json<ActionResponse> {
    apply(&state, |session| session.submit_feedback(&request.text)).await
}

async fn handle_chat(
    State(state): AppHandle,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let mut session = state.session.lock().await;
    let reply = session.chat(&request.message);
    Json(ChatResponse {
        reply,
        session: session.snapshot(),
    })
}

async fn handle_quiz(
    State(state): AppHandle,
    Json(request): Json<QuizRequest>,
) -> Json<QuizResponse> {
    let mut session = state.session.lock().await;
    let correct = session.answer_quiz(&request.question_id, request.choice);
    Json(QuizResponse {
        correct,
        session: session.snapshot(),
    })
}

/// Handler for `POST /api/activity/suggestions`.
///
/// The session lock is released while the pipeline runs, so other requests
/// (including a character switch that makes this result stale) proceed.
async fn handle_suggestions(
    State(state): AppHandle,
    Json(request): Json<SuggestionsRequest>,
) -> std::result::Result<Json<SuggestionsResponse>, ApiError> {
    let prepared = state
        .session
        .lock()
        .await
        .prepare_suggestions(&request.question_id);
    let Some((ticket, context)) = prepared else {
        return Err(ApiError::BadRequest(format!(
            "Cannot get suggestions for '{}': select a character in the activity first",
            request.question_id
        )));
    };

    let outcome = state.pipeline.get_suggestions(&context).await;

    let mut session = state.session.lock().await;
    let applied = session.resolve_suggestions(&ticket, outcome.clone());
    debug!(question = %ticket.question_id, applied, "Suggestions delivered");
    Ok(Json(SuggestionsResponse {
        applied,
        outcome,
        session: session.snapshot(),
    }))
}

async fn handle_dismiss_suggestions(State(state): AppHandle) -> Json<ActionResponse> {
    apply(&state, |session| {
        session.dismiss_suggestions();
        true
    })
    .await
}

async fn handle_dismiss_notice(
    State(state): AppHandle,
    Json(request): Json<DismissNoticeRequest>,
) -> Json<ActionResponse> {
    apply(&state, |session| session.dismiss_notice(request.id)).await
}

// ============================================================================
// Tests
// ============================================================================
