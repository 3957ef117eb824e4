//! `WebSocket` handler for live log tailing.
//!
//! Clients connect to `GET /log_stream` and receive the replayed history,
//! then every new line, each as one text frame rendered as
//! `<timestamp> - <text>`. When the client's queue overflowed, a
//! `Skipping <k> lines...` frame precedes the next line.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use logstream_core::GapTracker;
use tracing::debug;

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin tailing.
///
/// # Route
///
/// `GET /log_stream`
pub async fn ws_log_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: subscribe an observer and forward each
/// rendered line as a text frame until either side goes away.
///
/// The observer is owned by this function, so it is closed on every return
/// path.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let mut observer = state.subscribe();
    let mut tracker = GapTracker::new();
    debug!(observer = %observer.id(), "WebSocket client connected");

    loop {
        tokio::select! {
            // Next entry for this client.
            entry = observer.next() => {
                let Some(entry) = entry else {
                    debug!(observer = %observer.id(), "stream closed, shutting down WebSocket");
                    break;
                };
                for line in tracker.render(&entry).into_lines() {
                    if socket.send(Message::Text(line.into())).await.is_err() {
                        debug!(observer = %observer.id(), "WebSocket client disconnected (send failed)");
                        observer.close();
                        return;
                    }
                }
            }
            // Check if the client sent a close frame or disconnected.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(observer = %observer.id(), "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(observer = %observer.id(), "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(observer = %observer.id(), "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // Ignore other message types (text, binary from client).
                    }
                }
            }
        }
    }

    observer.close();
}
