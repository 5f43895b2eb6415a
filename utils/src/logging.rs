//! Tracing subscriber setup for the siglink binaries.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Output shape of the log stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line events.
    #[default]
    Text,
    /// One JSON object per event, with fields flattened for log shippers.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}, expected \"text\" or \"json\"")),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Filtering follows the `RUST_LOG` environment variable.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::from_default_env();
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_env_filter(filter)
            .init(),
    }
}
