//! Configuration for the client, loaded from environment variables.

use crate::error::ClientError;

/// Where to find the streamer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host of the streamer.
    pub host: String,
    /// Port of the streamer.
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: 8080,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `LOGSTREAM_HOST` -- host of the streamer (default `localhost`)
    /// - `LOGSTREAM_PORT` -- port of the streamer (default 8080)
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_vars(
            std::env::var("LOGSTREAM_HOST").ok(),
            std::env::var("LOGSTREAM_PORT").ok(),
        )
    }

    fn from_vars(host: Option<String>, port: Option<String>) -> Result<Self, ClientError> {
        let defaults = Self::default();
        let port = match port {
            Some(raw) => raw
                .parse()
                .map_err(|e| ClientError::Config(format!("invalid LOGSTREAM_PORT: {e}")))?,
            None => defaults.port,
        };
        Ok(Self {
            host: host.unwrap_or(defaults.host),
            port,
        })
    }

    /// `WebSocket` URL of the streamer's tail endpoint.
    pub fn stream_url(&self) -> String {
        format!("ws://{}:{}/log_stream", self.host, self.port)
    }
}
