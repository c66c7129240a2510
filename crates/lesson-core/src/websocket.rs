//! WebSocket stream of [`LessonEvent`]s.
//!
//! A client connecting to `/ws` first receives a `connected` event carrying
//! the session snapshot, then every event broadcast afterwards. The server
//! pings every 30 seconds and drops clients that miss three pongs in a row.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::events::LessonEvent;

/// Time between heartbeat pings.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum number of missed pong responses before disconnecting.
pub const MAX_MISSED_PONGS: u8 = 3;

/// Upgrades `GET /ws` to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    debug!("WebSocket upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(event: &LessonEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            warn!(event = event.event_name(), error = %e, "Failed to serialize event");
            None
        }
    }
}

/// Reacts to one frame from the client. Returns `Break` once the client
/// has gone away.
fn client_frame(
    frame: Option<Result<Message, axum::Error>>,
    missed_pongs: &mut u8,
) -> ControlFlow<(), Option<Message>> {
    match frame {
        Some(Ok(Message::Pong(_))) => {
            *missed_pongs = 0;
            ControlFlow::Continue(None)
        }
        Some(Ok(Message::Ping(data))) => ControlFlow::Continue(Some(Message::Pong(data))),
        // The stream is server to client; anything else the client says is ignored.
        Some(Ok(Message::Text(_) | Message::Binary(_))) => ControlFlow::Continue(None),
        Some(Ok(Message::Close(_))) => {
            debug!("Client requested close");
            ControlFlow::Break(())
        }
        Some(Err(e)) => {
            debug!(error = %e, "WebSocket error");
            ControlFlow::Break(())
        }
        None => ControlFlow::Break(()),
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before taking the snapshot so nothing falls in between.
    let mut events = state.broadcaster.subscribe();
    let snapshot = state.session.lock().await.snapshot();

    let Some(connected) = encode(&LessonEvent::connected(snapshot)) else {
        return;
    };
    if sink.send(connected).await.is_err() {
        debug!("Client left before the connected event");
        return;
    }
    info!("WebSocket client connected");

    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    // The first tick fires immediately.
    heartbeat.tick().await;
    let mut missed_pongs = 0u8;

    loop {
        let outgoing = tokio::select! {
            frame = stream.next() => match client_frame(frame, &mut missed_pongs) {
                ControlFlow::Continue(reply) => reply,
                ControlFlow::Break(()) => break,
            },

            event = events.recv() => match event {
                Ok(event) => encode(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagged");
                    None
                }
                Err(RecvError::Closed) => break,
            },

            _ = heartbeat.tick() => {
                missed_pongs += 1;
                if missed_pongs > MAX_MISSED_PONGS {
                    info!(missed = MAX_MISSED_PONGS, "Client stopped answering pings");
                    break;
                }
                Some(Message::Ping(Vec::new()))
            }
        };

        if let Some(message) = outgoing {
            if sink.send(message).await.is_err() {
                debug!("Send failed; client disconnected");
                break;
            }
        }
    }

    info!("WebSocket client disconnected");
}
