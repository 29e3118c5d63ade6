//! Process-wide logging setup for Burrow binaries.
//!
//! Libraries in this workspace only emit `tracing` events; installing a
//! subscriber is left to the binary, through [`init`].

use tracing_subscriber::filter::{EnvFilter, ParseError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, one line per event.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Installs the global subscriber.
///
/// Events are filtered by `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
/// Records emitted through the `log` crate (e.g. by sqlx) are forwarded too.
/// Fails if a global subscriber is already installed.
pub fn init(format: LogFormat) -> Result<(), TelemetryError> {
    init_with_default_filter(format, DEFAULT_FILTER)
}

/// Like [`init`], with a custom fallback filter such as `"burrow=debug,warn"`.
pub fn init_with_default_filter(format: LogFormat, default_filter: &str) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
    }

    tracing::debug!(?format, "tracing subscriber installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn second_install_fails() {
        let _ = init(LogFormat::Json);

        assert!(matches!(
            init(LogFormat::Text),
            Err(TelemetryError::Install(_))
        ));
    }
}
