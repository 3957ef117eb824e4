//! Error types for the client binary.

/// Top-level error for the client binary.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration could not be read from the environment.
    #[error("config error: {0}")]
    Config(String),

    /// The `WebSocket` connection failed.
    #[error("WebSocket error: {source}")]
    WebSocket {
        /// The underlying protocol error.
        #[from]
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// Writing to stdout failed.
    #[error("writing stdout: {source}")]
    Stdout {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
