//! Command-line client for a running logstreamer.
//!
//! Connects to the streamer's `/log_stream` `WebSocket` and prints every
//! line it receives to stdout until the server closes the connection.
//! Diagnostics go to stderr via tracing so stdout carries only log lines.

mod config;
mod error;

use futures::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Application entry point for the client.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the connection fails,
/// or stdout cannot be written.
#[tokio::main]
async fn main() -> Result<(), ClientError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env()?;
    let url = config.stream_url();

    info!(%url, "connecting");
    let (ws, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
    info!("streaming");

    let mut stdout = tokio::io::stdout();
    let lines = copy_frames(ws, &mut stdout).await?;

    info!(lines, "server closed the stream");
    Ok(())
}

/// Write each text frame from `frames` to `out` as one line.
///
/// Stops at a close frame or the end of the stream and returns the number
/// of lines written.
async fn copy_frames<S, W>(mut frames: S, out: &mut W) -> Result<u64, ClientError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines: u64 = 0;

    while let Some(frame) = frames.next().await {
        match frame? {
            Message::Text(text) => {
                out.write_all(text.as_str().as_bytes()).await?;
                out.write_all(b"\n").await?;
                out.flush().await?;
                lines = lines.saturating_add(1);
            }
            Message::Close(frame) => {
                debug!(?frame, "close frame received");
                break;
            }
            _ => {
                // Pings are answered by tungstenite; nothing else is sent.
            }
        }
    }

    Ok(lines)
}
