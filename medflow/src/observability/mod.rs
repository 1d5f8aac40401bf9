//! Observability utilities.
//!
//! Logging goes through `tracing`. Binaries install a subscriber once with
//! [`init_tracing`]; libraries only emit events and spans.

mod wide_events;

pub use wide_events::{emit_flow_run, flow_run_payload};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human-readable output.
    Pretty,
    /// Single-line, human-readable output.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        };
        f.write_str(s)
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected pretty, compact or json)")),
        }
    }
}

/// Installs the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `level`. Returns false if a subscriber
/// was already installed, in which case nothing changes.
pub fn init_tracing(level: &str, format: LogFormat) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.pretty().try_init().is_ok(),
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Json => builder.json().with_current_span(true).try_init().is_ok(),
    }
}
