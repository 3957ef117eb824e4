//! Log streamer binary.
//!
//! Reads lines from standard input into a bounded [`BufferedLogStream`] and
//! serves them over HTTP and `WebSocket` so any number of clients can tail
//! the output of the process piped into it:
//!
//! ```text
//! ./long-running-job | logstreamer
//! ```
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `logstream-config.yaml`
//! 3. Create the stream
//! 4. Start the HTTP server on a background task
//! 5. Pump stdin into the stream
//! 6. Keep serving after stdin ends, until `Ctrl-C`

mod error;
mod producer;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use logstream_core::BufferedLogStream;
use logstream_core::config::StreamerConfig;
use logstream_server::{AppState, ServerConfig};
use tokio::io::BufReader;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::StreamerError;

/// Application entry point for the streamer.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the server cannot bind,
/// or stdin cannot be read.
#[tokio::main]
async fn main() -> Result<(), StreamerError> {
    // 1. Initialize structured logging. Logs go to stderr so they never mix
    //    with anything the streamed process writes.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("logstreamer starting");

    // 2. Load configuration.
    let config = load_config()?;
    let capacity = config.stream.capacity()?;
    info!(
        max_lines = capacity.get(),
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    // 3. Create the stream.
    let stream = BufferedLogStream::with_capacity(capacity)?;

    // 4. Start the server.
    let state = Arc::new(AppState::new(stream.clone()));
    let server_config = ServerConfig::from(&config.server);
    let server = logstream_server::spawn_server(&server_config, state).await?;

    // 5. Pump stdin.
    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = producer::pump_lines(stdin, &stream) => {
            let lines = result?;
            info!(lines, "stdin closed, still serving history until interrupted");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            server.abort();
            return Ok(());
        }
    }

    // 6. Keep serving until interrupted.
    serve_until_interrupted(server, tokio::signal::ctrl_c()).await;

    Ok(())
}

/// Keep the server running until `signal` fires, then stop it.
///
/// If the signal cannot be listened for, the server keeps running until its
/// task ends on its own.
async fn serve_until_interrupted<S>(server: JoinHandle<()>, signal: S)
where
    S: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("interrupted");
            server.abort();
        }
        Err(e) => {
            error!(error = %e, "cannot listen for Ctrl-C, serving until the server stops");
            if let Err(e) = server.await {
                error!(error = %e, "server task failed");
            }
        }
    }
}

/// Load configuration from `logstream-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<StreamerConfig, StreamerError> {
    let config_path = Path::new("logstream-config.yaml");
    if config_path.exists() {
        Ok(StreamerConfig::from_file(config_path)?)
    } else {
        info!("Config file not found, using defaults");
        let mut config = StreamerConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn interrupt_stops_the_server() {
        let server = tokio::spawn(std::future::pending::<()>());
        let abort = server.abort_handle();

        tokio::time::timeout(
            Duration::from_secs(5),
            serve_until_interrupted(server, async { Ok(()) }),
        )
        .await
        .unwrap();

        for _ in 0..100 {
            if abort.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(abort.is_finished());
    }

    #[tokio::test]
    async fn failed_signal_keeps_serving_until_server_ends() {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);
        let server = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
        });

        let signal = async { Err(std::io::Error::other("no signal handler")) };
        serve_until_interrupted(server, signal).await;

        assert!(stopped.load(Ordering::SeqCst));
    }
}
