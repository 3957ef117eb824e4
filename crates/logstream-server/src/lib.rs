//! HTTP and `WebSocket` transport for logstream.
//!
//! This crate exposes a [`BufferedLogStream`] to remote readers through an
//! Axum server:
//!
//! - **`GET /log`** -- an HTML page that tails the stream over a `WebSocket`,
//!   or, for `curl` and `?ws=false`, a chunked plain-text body
//! - **`GET /log_stream`** -- `WebSocket` endpoint sending one text frame per
//!   rendered line
//! - **`GET /api/history`**, **`GET /api/history/{sequence}`** -- the
//!   buffered history as JSON
//! - **`GET /api/status`** -- capacity, observer count, next sequence
//!
//! # Architecture
//!
//! Every connection creates its own [`StreamObserver`] and drains it at its
//! own pace. A slow client only ever loses lines from its own queue (shown
//! as a `Skipping <k> lines...` line); it never slows the producer or other
//! clients. The observer is closed when the connection ends, whichever way
//! it ends.
//!
//! [`BufferedLogStream`]: logstream_core::BufferedLogStream
//! [`StreamObserver`]: logstream_core::StreamObserver

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::spawn_server;
pub use state::AppState;
