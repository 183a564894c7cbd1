//! Tracing subscriber setup for the client binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },
    #[error("Failed to init subscriber: {0}")]
    Init(String),
}

/// Filter to use: `RUST_LOG` when set, otherwise `default_filter`.
pub fn resolve_filter(default_filter: &str) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: default_filter.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber. Logs go to stderr so they never interleave
/// with the note listing on stdout.
pub fn init_tracing(default_filter: &str) -> Result<(), TelemetryError> {
    let env_filter = resolve_filter(default_filter)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::debug!(default_filter, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_filter_accepts_directives() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(resolve_filter("info,postit_client=debug").is_ok());
    }

    #[test]
    fn test_resolve_filter_rejects_garbage() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(matches!(
            resolve_filter("postit_client=loud"),
            Err(TelemetryError::InvalidFilter { .. })
        ));
    }
}
