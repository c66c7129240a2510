//! Integration tests for the WebSocket event stream.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use common::{config_for, post_json, spawn_lesson_server};
use futures::{SinkExt, StreamExt};
use lesson_core::{CompletionSignal, LessonEvent, Section};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tungstenite::Message;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const UNREACHABLE: &str = "http://127.0.0.1:9/api/chat";

async fn connect_client(addr: SocketAddr) -> WsClient {
    let (ws_stream, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("Failed to connect to WebSocket");
    ws_stream
}

/// Receives the next event, answering pings along the way.
async fn receive_event(client: &mut WsClient) -> LessonEvent {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timeout waiting for message")
            .expect("Stream ended")
            .expect("WebSocket error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("Failed to parse event");
            }
            Message::Ping(data) => {
                client
                    .send(Message::Pong(data))
                    .await
                    .expect("Failed to send pong");
            }
            Message::Pong(_) => {}
            other => panic!("Expected text message, got: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_connected_event_carries_session() {
    let (addr, _state) = spawn_lesson_server(config_for(UNREACHABLE)).await;
    let mut client = connect_client(addr).await;

    match receive_event(&mut client).await {
        LessonEvent::Connected(payload) => {
            assert_eq!(payload.session.lesson_id, "train-a-character");
            assert_eq!(payload.session.section, Section::Introduction);
        }
        other => panic!("Expected Connected event, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_section_end_is_streamed_to_every_client() {
    let (addr, _state) = spawn_lesson_server(config_for(UNREACHABLE)).await;
    let mut first = connect_client(addr).await;
    let mut second = connect_client(addr).await;
    receive_event(&mut first).await;
    receive_event(&mut second).await;

    let client = reqwest::Client::new();
    post_json(&client, addr, "/api/content/next", json!({})).await;

    for ws in [&mut first, &mut second] {
        match receive_event(ws).await {
            LessonEvent::SectionEnd(signal) => {
                assert_eq!(signal, CompletionSignal::for_section(Section::Introduction));
            }
            other => panic!("Expected SectionEnd event, got: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_navigation_and_activity_events_arrive_in_order() {
    let (addr, _state) = spawn_lesson_server(config_for(UNREACHABLE)).await;
    let mut ws = connect_client(addr).await;
    receive_event(&mut ws).await;

    let client = reqwest::Client::new();
    post_json(&client, addr, "/api/session/section", json!({"section": "activity"})).await;
    post_json(&client, addr, "/api/activity/character", json!({"name": "Harry Potter"})).await;
    post_json(&client, addr, "/api/activity/advance", json!({})).await;
    post_json(&client, addr, "/api/activity/advance", json!({})).await;

    // Selecting moves to pre-training; the second advance is blocked by
    // unanswered basic questions.
    let mut names = Vec::new();
    for _ in 0..4 {
        names.push(receive_event(&mut ws).await.event_name());
    }
    assert_eq!(
        names,
        vec!["sectionChanged", "phaseChanged", "phaseChanged", "notice"]
    );
}

#[tokio::test]
async fn test_broadcaster_events_reach_clients() {
    let (addr, state) = spawn_lesson_server(config_for(UNREACHABLE)).await;
    let mut ws = connect_client(addr).await;
    receive_event(&mut ws).await;

    // Anything published on the session's bus is forwarded.
    state.session.lock().await.bus().publish(&CompletionSignal::at_end());

    match receive_event(&mut ws).await {
        LessonEvent::SectionEnd(signal) => assert!(signal.section_id.is_none()),
        other => panic!("Expected SectionEnd event, got: {other:?}"),
    }
}
