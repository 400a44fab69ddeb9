#![forbid(unsafe_code)]

//! Shared vocabulary for Apollo.
//!
//! This crate holds the pieces every other Apollo crate leans on:
//!
//! - [`casing`]: kebab-case to camelCase conversion used by event conventions.
//! - [`value`]: loose value equality and payload description for diagnostics.
//! - [`config`]: [`ApolloConfig`] and the synchronization pattern type.
//! - [`clock`]: injectable monotonic time source.
//! - [`host`]: the host element abstraction plus a headless in-memory host.
//! - [`logging`]: tracing targets and optional subscriber installation.

pub mod casing;
pub mod clock;
pub mod config;
pub mod host;
pub mod logging;
pub mod value;

pub use casing::{capitalize, kebab_to_camel};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{
    ApolloConfig, Capability, ConfigError, DEFAULT_DEDUP_WINDOW, SuppressedReportPolicy,
    SyncPattern,
};
pub use host::{DomEvent, ElementRef, HostElement, Listener, ListenerId, MemoryElement};
pub use value::{Value, describe_payload, is_falsy, is_value_equals};
