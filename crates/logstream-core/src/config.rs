//! Configuration loading and typed config structures for logstream.
//!
//! The streamer reads `logstream-config.yaml` from the working directory when
//! it exists and falls back to defaults otherwise. Environment variables
//! override individual values so deployments can tune the streamer without
//! editing the file:
//!
//! - `LOGSTREAM_MAX_LINES` overrides `stream.max_lines`
//! - `LOGSTREAM_HOST` overrides `server.host`
//! - `LOGSTREAM_PORT` overrides `server.port`

use std::num::NonZeroUsize;
use std::path::Path;

use serde::Deserialize;

use crate::stream::MAX_CAPACITY;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value was present but not acceptable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level streamer configuration.
///
/// Mirrors the structure of `logstream-config.yaml`. Every field has a
/// default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamerConfig {
    /// History and queue sizing.
    #[serde(default)]
    pub stream: StreamConfig,

    /// HTTP listener settings.
    #[serde(default)]
    pub server: ListenConfig,
}

/// History and queue sizing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamConfig {
    /// Lines of history replayed to new observers; also the size of each
    /// observer's delivery queue.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenConfig {
    /// Address to bind (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl StreamerConfig {
    /// Load configuration from a YAML file, apply environment overrides, and
    /// validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment overrides,
    /// and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override values with `LOGSTREAM_*` environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not parse.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override values from `lookup`, which maps a `LOGSTREAM_*` variable
    /// name to its value when set.
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("LOGSTREAM_MAX_LINES") {
            self.stream.max_lines = val.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("LOGSTREAM_MAX_LINES={val}: {e}"),
            })?;
        }
        if let Some(val) = lookup("LOGSTREAM_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("LOGSTREAM_PORT") {
            self.server.port = val.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("LOGSTREAM_PORT={val}: {e}"),
            })?;
        }
        Ok(())
    }

    /// Check that values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `stream.max_lines` is 0 or larger
    /// than [`MAX_CAPACITY`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stream.capacity().map(|_| ())
    }
}

impl StreamConfig {
    /// `max_lines` as a validated capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `max_lines` is 0 or larger than
    /// [`MAX_CAPACITY`].
    pub fn capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        if self.max_lines > MAX_CAPACITY {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "stream.max_lines {} exceeds the maximum of {MAX_CAPACITY}",
                    self.max_lines
                ),
            });
        }
        NonZeroUsize::new(self.max_lines).ok_or_else(|| ConfigError::Invalid {
            reason: String::from("stream.max_lines must be at least 1"),
        })
    }
}

const fn default_max_lines() -> usize {
    10
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}
