//! Shared application state for the log transport.

use logstream_core::{BufferedLogStream, StreamObserver};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. Holds the handle to the stream that every connection
/// subscribes to.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The stream being served.
    pub stream: BufferedLogStream,
}

impl AppState {
    /// Create application state serving `stream`.
    pub const fn new(stream: BufferedLogStream) -> Self {
        Self { stream }
    }

    /// Subscribe a new observer for one connection.
    pub fn subscribe(&self) -> StreamObserver {
        self.stream.new_observer()
    }
}
