//! Axum router construction for the log transport.
//!
//! Assembles all routes (tail page, `WebSocket`, JSON API) into a single
//! [`Router`] with CORS and request tracing enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` and `GET /log` -- tail page or plain-text stream
/// - `GET /log_stream` -- `WebSocket` tail
/// - `GET /api/history` -- buffered history
/// - `GET /api/history/{sequence}` -- one buffered entry
/// - `GET /api/status` -- stream counters
///
/// CORS allows any origin so the tail page can be embedded elsewhere.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Tail page
        .route("/", get(handlers::log_page))
        .route("/log", get(handlers::log_page))
        // WebSocket
        .route("/log_stream", get(ws::ws_log_stream))
        // JSON API
        .route("/api/history", get(handlers::get_history))
        .route("/api/history/{sequence}", get(handlers::get_entry))
        .route("/api/status", get(handlers::get_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
