//! Error types for the streamer binary.
//!
//! [`StreamerError`] is the top-level error type that wraps all possible
//! failure modes during startup and while pumping stdin.

/// Top-level error for the streamer binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum StreamerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: logstream_core::config::ConfigError,
    },

    /// The stream could not be created.
    #[error("stream error: {source}")]
    Stream {
        /// The underlying stream error.
        #[from]
        source: logstream_core::StreamError,
    },

    /// The HTTP server failed to start.
    #[error("server error: {source}")]
    Server {
        /// The underlying startup error.
        #[from]
        source: logstream_server::startup::StartupError,
    },

    /// Reading from stdin failed.
    #[error("reading stdin: {source}")]
    Stdin {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
