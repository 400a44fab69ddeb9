#![forbid(unsafe_code)]

//! Tracing targets and optional subscriber installation.
//!
//! Every engine logs through the `tracing` facade under one of the targets
//! below, so hosts can filter them independently (`RUST_LOG=apollo::sync=debug`).
//! Installing a subscriber is the host's choice; the `subscriber` feature
//! provides [`init`] for hosts that want the config-driven default.

use crate::config::ApolloConfig;

/// Target for property synchronization diagnostics.
pub const SYNC_TARGET: &str = "apollo::sync";
/// Target for event convention and dispatch diagnostics.
pub const EVENTS_TARGET: &str = "apollo::events";
/// Target for data provider resolution diagnostics.
pub const PROVIDER_TARGET: &str = "apollo::provider";
/// Target for component lifecycle diagnostics.
pub const COMPONENT_TARGET: &str = "apollo::component";
/// Target for configuration loading diagnostics.
pub const CONFIG_TARGET: &str = "apollo::config";

/// Filter directive implied by the config's verbosity flags.
///
/// `no_log` wins over `debug`.
#[must_use]
pub fn level_directive(config: &ApolloConfig) -> &'static str {
    if config.no_log {
        "off"
    } else if config.debug {
        "debug"
    } else {
        "info"
    }
}

/// Error returned when a global subscriber is already installed.
#[cfg(feature = "subscriber")]
#[derive(Debug)]
pub struct LoggingInitError(String);

#[cfg(feature = "subscriber")]
impl std::fmt::Display for LoggingInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to install tracing subscriber: {}", self.0)
    }
}

#[cfg(feature = "subscriber")]
impl std::error::Error for LoggingInitError {}

/// Install a global `fmt` subscriber filtered by the config's verbosity.
///
/// `RUST_LOG` takes precedence when set.
///
/// # Errors
///
/// [`LoggingInitError`] when a global subscriber already exists.
#[cfg(feature = "subscriber")]
pub fn init(config: &ApolloConfig) -> Result<(), LoggingInitError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(config)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    #[cfg(feature = "tracing-json")]
    let result = builder.json().try_init();
    #[cfg(not(feature = "tracing-json"))]
    let result = builder.try_init();

    result.map_err(|err| LoggingInitError(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_follows_flags() {
        assert_eq!(level_directive(&ApolloConfig::new()), "info");
        assert_eq!(level_directive(&ApolloConfig::new().with_debug(true)), "debug");
        assert_eq!(
            level_directive(&ApolloConfig::new().with_debug(true).with_no_log(true)),
            "off"
        );
    }
}
