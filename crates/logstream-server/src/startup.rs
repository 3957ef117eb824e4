//! Server startup helper for embedding next to a producer.
//!
//! Provides [`spawn_server`] which binds the listener eagerly and then runs
//! the server on a background Tokio task, so the caller can keep feeding
//! the stream on its own task.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use logstream_core::BufferedLogStream;
//! use logstream_server::{spawn_server, AppState, ServerConfig};
//!
//! let stream = BufferedLogStream::new(10)?;
//! let state = Arc::new(AppState::new(stream.clone()));
//! let handle = spawn_server(&ServerConfig::default(), state).await?;
//! stream.write_line("hello");
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the HTTP server on a background Tokio task.
///
/// The listener is bound before this returns, so address and port errors
/// surface here rather than inside the background task. The returned
/// [`JoinHandle`] resolves if the server later fails; the caller should hold
/// it and abort or await it during shutdown.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or cannot be
/// bound.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = crate::server::bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::serve(listener, state).await {
            tracing::error!(error = %e, "logstream server exited with error");
        }
    });

    tracing::info!(host = %config.host, port = config.port, "logstream server spawned on background task");

    Ok(handle)
}
