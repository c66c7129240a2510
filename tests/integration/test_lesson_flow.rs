//! Integration tests walking a whole lesson over the HTTP API.

mod common;

use std::net::SocketAddr;

use common::{config_for, post_json, spawn_lesson_server};
use lesson_core::SessionSnapshot;
use serde_json::{json, Value};

/// Nothing listens on the discard port, so suggestions always fall back.
const UNREACHABLE: &str = "http://127.0.0.1:9/api/chat";

async fn post(client: &reqwest::Client, addr: SocketAddr, path: &str) -> Value {
    let (status, body) = post_json(client, addr, path, json!({})).await;
    assert!(status.is_success(), "{path} failed with {status}: {body}");
    body
}

async fn answer_all(client: &reqwest::Client, addr: SocketAddr, ids: &[&str]) {
    for id in ids {
        post_json(
            client,
            addr,
            "/api/activity/response",
            json!({"questionId": id, "text": format!("Answer to {id}")}),
        )
        .await;
    }
}

#[tokio::test]
async fn test_lessons_are_listed() {
    let (addr, _state) = spawn_lesson_server(config_for(UNREACHABLE)).await;

    let lessons: Value = reqwest::get(format!("http://{addr}/api/lessons"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids: Vec<&str> = lessons
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|l| l["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["train-a-character", "what-is-ai"]);
}

#[tokio::test]
async fn test_unknown_lesson_offers_recovery() {
    let (addr, _state) = spawn_lesson_server(config_for(UNREACHABLE)).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        addr,
        "/api/session/lesson",
        json!({"lessonId": "time-travel"}),
    )
    .await;

    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    assert_eq!(body["recovery"], "Return to the lesson list");

    // The current lesson is untouched.
    let session: SessionSnapshot = reqwest::get(format!("http://{addr}/api/session"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session.lesson_id, "train-a-character");
}

#[tokio::test]
async fn test_complete_lesson_walkthrough() {
    let (addr, _state) = spawn_lesson_server(config_for(UNREACHABLE)).await;
    let client = reqwest::Client::new();

    // Introduction: two pages.
    assert_eq!(post(&client, addr, "/api/session/continue").await["applied"], false);
    let body = post(&client, addr, "/api/content/next").await;
    assert_eq!(body["session"]["atSectionEnd"], true);
    let body = post(&client, addr, "/api/session/continue").await;
    assert_eq!(body["session"]["section"], "tutorial");

    // Tutorial: three pages.
    post(&client, addr, "/api/content/next").await;
    assert_eq!(post(&client, addr, "/api/session/continue").await["applied"], false);
    post(&client, addr, "/api/content/next").await;
    let body = post(&client, addr, "/api/session/continue").await;
    assert_eq!(body["session"]["section"], "activity");
    assert_eq!(body["session"]["content"], "training");
    assert_eq!(body["session"]["activity"]["phase"], "selection");

    // Selection is gated on a character.
    assert_eq!(post(&client, addr, "/api/activity/advance").await["applied"], false);
    let (_, body) = post_json(
        &client,
        addr,
        "/api/activity/character",
        json!({"name": "Sherlock Holmes"}),
    )
    .await;
    assert_eq!(body["session"]["activity"]["phase"], "pre-training");

    // Pre-training chat uses the character's canned replies.
    let (_, body) =
        post_json(&client, addr, "/api/activity/chat", json!({"message": "Hello"})).await;
    assert!(body["reply"].is_string());

    let body = post(&client, addr, "/api/activity/advance").await;
    assert_eq!(body["session"]["activity"]["phase"], "basic");
    answer_all(&client, addr, &["greeting", "favorite-thing"]).await;
    let body = post(&client, addr, "/api/activity/advance").await;
    assert_eq!(body["applied"], false);
    assert_eq!(body["session"]["activity"]["missingQuestions"], json!(["problem-solving"]));

    answer_all(&client, addr, &["problem-solving"]).await;
    let body = post(&client, addr, "/api/activity/advance").await;
    assert_eq!(body["session"]["activity"]["phase"], "feedback");

    let (_, body) =
        post_json(&client, addr, "/api/activity/feedback", json!({"text": "Fun!"})).await;
    assert_eq!(body["session"]["activity"]["phase"], "advanced");
    assert_eq!(body["session"]["activity"]["feedback"], "Fun!");

    answer_all(&client, addr, &["hard-day", "advice", "secret"]).await;
    let body = post(&client, addr, "/api/activity/advance").await;
    assert_eq!(body["session"]["activity"]["phase"], "practice");

    // Practice replies come from the trained set.
    let (_, body) = post_json(
        &client,
        addr,
        "/api/activity/chat",
        json!({"message": "Any advice for me?"}),
    )
    .await;
    assert_eq!(body["reply"], "Answer to advice");

    post(&client, addr, "/api/activity/advance").await;
    let body = post(&client, addr, "/api/activity/advance").await;
    assert_eq!(body["session"]["activity"]["phase"], "quiz");
    assert_eq!(body["session"]["atSectionEnd"], false);

    for (id, choice) in [("q1", 1), ("q2", 0), ("q3", 2)] {
        let (_, body) = post_json(
            &client,
            addr,
            "/api/activity/quiz",
            json!({"questionId": id, "choice": choice}),
        )
        .await;
        assert_eq!(body["correct"], true);
    }

    let session: SessionSnapshot = reqwest::get(format!("http://{addr}/api/session"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(session.at_section_end);
    assert!(session.can_continue);

    // Code: running the sample ends the section, but there is nowhere to continue to.
    let body = post(&client, addr, "/api/session/continue").await;
    assert_eq!(body["session"]["section"], "code");
    let body = post(&client, addr, "/api/content/next").await;
    assert_eq!(body["session"]["atSectionEnd"], true);
    assert_eq!(body["session"]["canContinue"], false);
    assert_eq!(body["session"]["lessonComplete"], true);
}

#[tokio::test]
async fn test_back_and_direct_section_selection() {
    let (addr, _state) = spawn_lesson_server(config_for(UNREACHABLE)).await;
    let client = reqwest::Client::new();

    let (_, body) =
        post_json(&client, addr, "/api/session/section", json!({"section": "code"})).await;
    assert_eq!(body["session"]["section"], "code");
    assert_eq!(body["session"]["atSectionEnd"], false);

    let body = post(&client, addr, "/api/session/back").await;
    assert_eq!(body["session"]["section"], "activity");

    let (_, body) =
        post_json(&client, addr, "/api/session/section", json!({"section": "CODE!"})).await;
    assert_eq!(body["applied"], false);
    assert_eq!(body["session"]["section"], "activity");
}

#[tokio::test]
async fn test_switching_lessons() {
    let (addr, _state) = spawn_lesson_server(config_for(UNREACHABLE)).await;
    let client = reqwest::Client::new();

    let (_, body) = post_json(
        &client,
        addr,
        "/api/session/lesson",
        json!({"lessonId": "what-is-ai"}),
    )
    .await;
    assert_eq!(body["session"]["lessonTitle"], "What Is AI?");
    // A one-page introduction is finished as soon as it mounts.
    assert_eq!(body["session"]["canContinue"], true);
}
