//! HTTP endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/log` | HTML tail page, or plain-text stream for `curl` / `?ws=false` |
//! | `GET` | `/api/history` | Buffered history, oldest first |
//! | `GET` | `/api/history/{sequence}` | One buffered entry |
//! | `GET` | `/api/status` | Capacity, observer count, next sequence |

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{Html, IntoResponse, Response};
use futures::StreamExt;
use logstream_core::{GapTracker, LogEntry};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for `GET /log`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct LogQuery {
    /// `false` forces the plain-text stream instead of the `WebSocket` page.
    pub ws: Option<String>,
}

/// Serve the tail page or stream the log as plain text.
///
/// Clients that cannot run the `WebSocket` page (`curl`, or anything passing
/// `?ws=false`) get a chunked `text/plain` body that stays open and receives
/// every new line. The observer behind it is closed when the client goes
/// away and the body is dropped.
pub async fn log_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
    headers: HeaderMap,
) -> Response {
    if wants_websocket(&query, &headers) {
        Html(LOG_PAGE).into_response()
    } else {
        plain_text_stream(&state)
    }
}

/// Whether a `GET /log` request should be served the `WebSocket` page.
pub fn wants_websocket(query: &LogQuery, headers: &HeaderMap) -> bool {
    if query.ws.as_deref() == Some("false") {
        return false;
    }

    // curl cannot speak WebSocket.
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    !user_agent.contains("curl")
}

fn plain_text_stream(state: &AppState) -> Response {
    let observer = state.subscribe();
    debug!(observer = %observer.id(), "plain-text client connected");

    let mut tracker = GapTracker::new();
    let body = observer.map(move |entry| Ok::<_, Infallible>(tracker.render(&entry).into_text()));

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response()
}

/// Return the buffered history, oldest first.
pub async fn get_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let entries = state.stream.history();
    Json(serde_json::json!({
        "count": entries.len(),
        "capacity": state.stream.capacity().get(),
        "entries": entries,
    }))
}

/// Return one entry from the buffered history.
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path(sequence): Path<u64>,
) -> Result<Json<LogEntry>, ApiError> {
    state
        .stream
        .entry(sequence)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("entry {sequence} is not in history")))
}

/// Return stream status counters.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "capacity": state.stream.capacity().get(),
        "observers": state.stream.observer_count(),
        "next_sequence": state.stream.next_sequence(),
    }))
}

/// Tail page. Opens a `WebSocket` to `/log_stream` and appends each frame;
/// browsers without `WebSocket` support fall back to the plain-text stream.
const LOG_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>logstream</title>
    <style>
        body {
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 1rem;
        }
        #out { white-space: pre-wrap; }
    </style>
    <script type="text/javascript">
        function tail() {
            if (!("WebSocket" in window)) {
                window.location = "/log?ws=false";
                return;
            }
            var scheme = window.location.protocol === "https:" ? "wss://" : "ws://";
            var ws = new WebSocket(scheme + window.location.host + "/log_stream");
            ws.onmessage = function (evt) {
                var out = document.getElementById("out");
                out.appendChild(document.createTextNode(evt.data + "\n"));
            };
            ws.onerror = function () {
                ws.close();
            };
        }
        window.onload = tail;
    </script>
</head>
<body><div id="out"></div></body>
</html>
"#;
