//! Logging setup for applications embedding the diary.
//!
//! The library itself only emits `tracing` events; hosts call one of these
//! once at startup to get them on stderr.

use crate::{Error, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default directive when `RUST_LOG` is unset
pub const DEFAULT_LEVEL: &str = "info";

/// Initialize logging with sensible defaults
///
/// Compact output filtered by `RUST_LOG`, falling back to [`DEFAULT_LEVEL`].
/// Does nothing if the host already installed a subscriber.
pub fn init() {
    if let Err(e) = try_init_with_level(DEFAULT_LEVEL) {
        tracing::debug!("Logging already initialized: {}", e);
    }
}

/// Initialize logging with a specific default level
///
/// `RUST_LOG` still takes precedence. Fails if a global subscriber is
/// already set or the level is not a valid filter directive.
pub fn try_init_with_level(default_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .map_err(|e| Error::Config(format!("invalid log level {:?}: {}", default_level, e)))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install subscriber: {}", e)))
}

/// Initialize logging for tests (output captured per test)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        init_test();
        init();
        init();
    }
}
