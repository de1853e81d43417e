//! Logging setup for hosts and the simulation binary.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::prelude::*;

use crate::config::LogFormat;

/// Install a global subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init(format: LogFormat, default_filter: &str) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails_instead_of_panicking() {
        let first = init(LogFormat::Pretty, "warn");
        let second = init(LogFormat::Json, "warn");
        // Another test may have installed a subscriber first.
        assert!(first.is_err() || second.is_err());
    }
}
