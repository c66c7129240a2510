//! Integration tests for the suggestion pipeline against a live HTTP service.

mod common;

use std::time::Duration;

use common::{config_for, post_json, spawn_fake_service, spawn_lesson_server, FakeReply};
use lesson_suggest::{
    FallbackReason, PipelineConfig, SuggestionContext, SuggestionPipeline, SuggestionSource,
};
use serde_json::json;

fn pipeline(endpoint: &str) -> SuggestionPipeline<lesson_suggest::HttpTextGenerator> {
    SuggestionPipeline::from_endpoint(
        endpoint,
        PipelineConfig {
            timeout: Duration::from_secs(1),
            max_suggestions: 3,
        },
    )
}

fn harry_greeting() -> SuggestionContext {
    SuggestionContext::new("harry-potter", "Harry Potter", "greeting")
        .with_question("How would Harry Potter say hello to a new friend?")
        .with_traits(["brave", "loyal"])
}

fn fallback_reason(source: SuggestionSource) -> Option<FallbackReason> {
    match source {
        SuggestionSource::Fallback { reason } => Some(reason),
        SuggestionSource::Service => None,
    }
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_numbered_reply_is_parsed() {
    let service = spawn_fake_service(FakeReply::Answer(
        "Here you go:\n1. Hi, I'm Harry!\n2. Welcome to Hogwarts!\n3. Fancy some Quidditch?\n4. Extra".to_string(),
    ))
    .await;

    let outcome = pipeline(&service.endpoint).get_suggestions(&harry_greeting()).await;

    assert_eq!(outcome.source, SuggestionSource::Service);
    assert_eq!(
        outcome.suggestions,
        vec!["Hi, I'm Harry!", "Welcome to Hogwarts!", "Fancy some Quidditch?"]
    );

    let prompts = service.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Harry Potter"));
}

#[tokio::test]
async fn test_server_error_falls_back() {
    let service = spawn_fake_service(FakeReply::Status(500)).await;

    let outcome = pipeline(&service.endpoint).get_suggestions(&harry_greeting()).await;

    assert_eq!(fallback_reason(outcome.source), Some(FallbackReason::Status));
    assert_eq!(outcome.suggestions.len(), 3);
    assert!(outcome.notice().is_some());
}

#[tokio::test]
async fn test_slow_service_times_out_without_retry() {
    let service = spawn_fake_service(FakeReply::Slow(
        Duration::from_secs(3),
        "1. Too\n2. Late".to_string(),
    ))
    .await;

    let started = std::time::Instant::now();
    let outcome = pipeline(&service.endpoint).get_suggestions(&harry_greeting()).await;

    assert_eq!(fallback_reason(outcome.source), Some(FallbackReason::Timeout));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(service.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_single_sentence_reply_falls_back() {
    let service =
        spawn_fake_service(FakeReply::Answer("Harry would just wave.".to_string())).await;

    let outcome = pipeline(&service.endpoint).get_suggestions(&harry_greeting()).await;

    assert_eq!(fallback_reason(outcome.source), Some(FallbackReason::Unparsable));
    assert!(!outcome.suggestions.is_empty());
}

#[tokio::test]
async fn test_blank_reply_falls_back() {
    let service = spawn_fake_service(FakeReply::Answer("   ".to_string())).await;

    let outcome = pipeline(&service.endpoint).get_suggestions(&harry_greeting()).await;

    assert_eq!(fallback_reason(outcome.source), Some(FallbackReason::EmptyReply));
}

#[tokio::test]
async fn test_unknown_character_gets_templated_fallback() {
    let context = SuggestionContext::new("gandalf", "Gandalf", "greeting");
    let outcome = pipeline("http://127.0.0.1:9/api/chat").get_suggestions(&context).await;

    assert_eq!(fallback_reason(outcome.source), Some(FallbackReason::Network));
    assert!(outcome.suggestions.iter().any(|s| s.contains("Gandalf")));
}

// ============================================================================
// Through the Lesson API
// ============================================================================

#[tokio::test]
async fn test_suggestions_through_lesson_api() {
    let service = spawn_fake_service(FakeReply::Answer(
        "1. Hello!\n2. Nice to meet you!\n3. Hey there!".to_string(),
    ))
    .await;
    let (addr, _state) = spawn_lesson_server(config_for(&service.endpoint)).await;
    let client = reqwest::Client::new();

    post_json(&client, addr, "/api/session/section", json!({"section": "activity"})).await;
    post_json(&client, addr, "/api/activity/character", json!({"name": "Harry Potter"})).await;
    post_json(
        &client,
        addr,
        "/api/activity/response",
        json!({"questionId": "greeting", "text": "Wotcher, mate"}),
    )
    .await;

    let (status, body) = post_json(
        &client,
        addr,
        "/api/activity/suggestions",
        json!({"questionId": "greeting"}),
    )
    .await;

    assert!(status.is_success());
    assert_eq!(body["applied"], true);
    assert_eq!(body["outcome"]["source"]["kind"], "service");
    assert_eq!(body["outcome"]["suggestions"][1], "Nice to meet you!");
    assert_eq!(body["session"]["suggestions"]["questionId"], "greeting");
    assert_eq!(body["session"]["notices"], json!([]));

    // The learner's attempt steers the prompt.
    assert!(service.prompts.lock().unwrap()[0].contains("\"Wotcher, mate\""));
}

#[tokio::test]
async fn test_fallback_through_lesson_api_raises_notice() {
    let service = spawn_fake_service(FakeReply::Status(503)).await;
    let (addr, _state) = spawn_lesson_server(config_for(&service.endpoint)).await;
    let client = reqwest::Client::new();

    post_json(&client, addr, "/api/session/section", json!({"section": "activity"})).await;
    post_json(&client, addr, "/api/activity/character", json!({"name": "Sherlock Holmes"})).await;

    let (_, body) = post_json(
        &client,
        addr,
        "/api/activity/suggestions",
        json!({"questionId": "advice"}),
    )
    .await;

    assert_eq!(body["outcome"]["source"]["kind"], "fallback");
    assert_eq!(body["outcome"]["source"]["reason"], "status");
    assert_eq!(body["session"]["notices"][0]["kind"], "suggestionFallback");
}

#[tokio::test]
async fn test_character_switch_discards_in_flight_suggestions() {
    let service = spawn_fake_service(FakeReply::Slow(
        Duration::from_millis(500),
        "1. Hello!\n2. Hi!".to_string(),
    ))
    .await;
    let (addr, _state) = spawn_lesson_server(config_for(&service.endpoint)).await;
    let client = reqwest::Client::new();

    post_json(&client, addr, "/api/session/section", json!({"section": "activity"})).await;
    post_json(&client, addr, "/api/activity/character", json!({"name": "Harry Potter"})).await;

    let pending = {
        let client = client.clone();
        tokio::spawn(async move {
            post_json(
                &client,
                addr,
                "/api/activity/suggestions",
                json!({"questionId": "greeting"}),
            )
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    post_json(&client, addr, "/api/activity/character", json!({"name": "Hermione Granger"})).await;

    let (status, body) = pending.await.unwrap();
    assert!(status.is_success());
    assert_eq!(body["applied"], false);
    assert!(body["session"].get("suggestions").is_none());
}
