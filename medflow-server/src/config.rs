//! Server configuration.
//!
//! Settings come from defaults, then an optional JSON file named by
//! `MEDFLOW_CONFIG`, then individual environment variables.

use medflow::observability::LogFormat;
use medflow::transcription::FlowConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Names the JSON configuration file.
pub const CONFIG_PATH_VAR: &str = "MEDFLOW_CONFIG";
/// Overrides the bind host.
pub const HOST_VAR: &str = "MEDFLOW_HOST";
/// Overrides the bind port.
pub const PORT_VAR: &str = "MEDFLOW_PORT";
/// Overrides the log level.
pub const LOG_VAR: &str = "MEDFLOW_LOG";
/// Overrides the log format.
pub const LOG_FORMAT_VAR: &str = "MEDFLOW_LOG_FORMAT";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// The file.
        path: PathBuf,
        /// The I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`ServerConfig`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// The file.
        path: PathBuf,
        /// The parse error.
        source: serde_json::Error,
    },

    /// An environment variable holds an unusable value.
    #[error("invalid value '{value}' for {var}: {reason}")]
    InvalidValue {
        /// The variable.
        var: &'static str,
        /// The value found.
        value: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Configuration for the transcription server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log line format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Whether to allow requests from any origin.
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
    /// Outbound messages buffered per connection.
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
    /// Seconds between server-initiated pings.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// Transcription flow settings.
    #[serde(default)]
    pub flow: FlowConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_cors_permissive() -> bool {
    true
}

const fn default_outbound_capacity() -> usize {
    256
}

const fn default_ping_interval_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            cors_permissive: default_cors_permissive(),
            outbound_capacity: default_outbound_capacity(),
            ping_interval_secs: default_ping_interval_secs(),
            flow: FlowConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Sets the log format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Enables or disables the permissive CORS policy.
    #[must_use]
    pub const fn with_cors_permissive(mut self, enabled: bool) -> Self {
        self.cors_permissive = enabled;
        self
    }

    /// Sets the ping interval in seconds.
    #[must_use]
    pub const fn with_ping_interval_secs(mut self, secs: u64) -> Self {
        self.ping_interval_secs = secs;
        self
    }

    /// Sets the flow settings.
    #[must_use]
    pub fn with_flow(mut self, flow: FlowConfig) -> Self {
        self.flow = flow;
        self
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the ping interval.
    #[must_use]
    pub const fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    /// Reads a JSON configuration file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from variables looked up through `lookup`.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_VAR) {
            self.host = host;
        }
        if let Some(port) = lookup(PORT_VAR) {
            self.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: PORT_VAR,
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(level) = lookup(LOG_VAR) {
            self.log_level = level;
        }
        if let Some(format) = lookup(LOG_FORMAT_VAR) {
            self.log_format = format
                .parse()
                .map_err(|reason| ConfigError::InvalidValue {
                    var: LOG_FORMAT_VAR,
                    value: format.clone(),
                    reason,
                })?;
        }
        Ok(self)
    }

    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        base.apply_overrides(|var| std::env::var(var).ok())
    }
}
