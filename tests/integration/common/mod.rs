//! Shared helpers: a fake text-generation service and a live lesson server.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use lesson_core::{create_router, AppState, Config};
use lesson_suggest::ChatRequest;
use serde_json::json;
use tokio::net::TcpListener;

/// How the fake text-generation service answers.
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// `200 {"answer": text}`.
    Answer(String),
    /// The given status with a plain body.
    Status(u16),
    /// Waits, then answers with `text`.
    Slow(Duration, String),
}

/// Handle onto a running fake service.
#[derive(Debug, Clone)]
pub struct FakeService {
    /// Full URL of the chat endpoint.
    pub endpoint: String,
    /// Prompts received, in order.
    pub prompts: Arc<Mutex<Vec<String>>>,
}

#[derive(Clone)]
struct FakeState {
    reply: FakeReply,
    prompts: Arc<Mutex<Vec<String>>>,
}

async fn fake_chat(State(state): State<FakeState>, Json(request): Json<ChatRequest>) -> axum::response::Response {
    state
        .prompts
        .lock()
        .expect("prompt log poisoned")
        .push(request.message);

    match state.reply {
        FakeReply::Answer(text) => Json(json!({ "answer": text })).into_response(),
        FakeReply::Status(code) => (
            StatusCode::from_u16(code).expect("valid status"),
            "service unavailable",
        )
            .into_response(),
        FakeReply::Slow(delay, text) => {
            tokio::time::sleep(delay).await;
            Json(json!({ "answer": text })).into_response()
        }
    }
}

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    (listener, addr)
}

/// Starts a fake text-generation service on an ephemeral port.
pub async fn spawn_fake_service(reply: FakeReply) -> FakeService {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/api/chat", post(fake_chat))
        .with_state(FakeState {
            reply,
            prompts: Arc::clone(&prompts),
        });

    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Fake service failed");
    });

    FakeService {
        endpoint: format!("http://{addr}/api/chat"),
        prompts,
    }
}

/// Starts the lesson API and returns its address with the shared state.
pub async fn spawn_lesson_server(config: Config) -> (SocketAddr, AppState) {
    let state = AppState::new(config).expect("Invalid test config");
    let router = create_router(state.clone());

    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    (addr, state)
}

/// A config pointing at `endpoint` with a short timeout.
pub fn config_for(endpoint: &str) -> Config {
    Config {
        suggestion_endpoint: endpoint.to_string(),
        suggestion_timeout_secs: 1,
        ..Config::default()
    }
}

/// Posts JSON to the lesson API and returns the status and decoded body.
pub async fn post_json(
    client: &reqwest::Client,
    addr: SocketAddr,
    path: &str,
    body: serde_json::Value,
) -> (reqwest::StatusCode, serde_json::Value) {
    let response = client
        .post(format!("http://{addr}{path}"))
        .json(&body)
        .send()
        .await
        .expect("Request failed");
    let status = response.status();
    let body = response.json().await.expect("Response was not JSON");
    (status, body)
}
