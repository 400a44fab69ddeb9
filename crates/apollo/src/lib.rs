#![forbid(unsafe_code)]

//! # Apollo
//!
//! Cross-cutting behavior for reactive UI components:
//!
//! - **Data sync**: named properties kept in step across component instances
//!   that never reference each other, with a value-and-time dedup window that
//!   stops mutually synced components from echoing changes back and forth.
//! - **Events**: `"<tag>:event-<name>"` / `"<tag>:command-<name>"`
//!   conventions turned into generated emitters and delegated DOM listeners.
//! - **Data providers**: named loaders resolved through a registry with
//!   resolver and default fallbacks.
//!
//! An [`ApolloContext`] owns the shared services. Components are built with
//! [`Component::builder`], described by a [`ComponentDefinition`], and wired
//! by [`ApolloContext::mount`].
//!
//! ```
//! use apollo::prelude::*;
//! use serde_json::json;
//!
//! let ctx = ApolloContext::new(ApolloConfig::default().with_data_sync_pattern("^shared"));
//! let def = ComponentDefinition::new().with_sync(SyncSource::inherit());
//!
//! let a = ctx.mount(Component::builder("a").property("sharedCount", json!(0)).build(), &def);
//! let b = ctx.mount(Component::builder("b").property("sharedCount", json!(0)).build(), &def);
//!
//! a.component().set("sharedCount", json!(5));
//! assert_eq!(b.component().get("sharedCount"), Some(json!(5)));
//! ```

pub mod context;
pub mod definition;
pub mod mount;
pub mod provider;

pub use context::ApolloContext;
pub use definition::{ComponentDefinition, DataLoadedFn, ProviderConfigFn};
pub use mount::{MountedComponent, PROVIDER_PROPERTY};
pub use provider::{
    COMPONENT_NAME_KEY, DataProvider, ProviderError, ProviderRegistry, ProviderRequest,
    SharedProvider, StaticProvider,
};

pub use apollo_core as core;
pub use apollo_events as events;
pub use apollo_runtime as runtime;

pub use apollo_core::{ApolloConfig, Capability, ManualClock, MemoryElement, SyncPattern};
pub use apollo_events::{EventDescriptor, EventError, fire};
pub use apollo_runtime::{Component, Method, SyncEntry, SyncSource};

#[cfg(feature = "subscriber")]
pub use apollo_core::logging::init as init_logging;

/// Everything needed to define, build and mount components.
pub mod prelude {
    pub use crate::{
        ApolloConfig, ApolloContext, Capability, Component, ComponentDefinition, DataProvider,
        EventDescriptor, ManualClock, MemoryElement, Method, MountedComponent, ProviderRegistry,
        StaticProvider, SyncEntry, SyncSource,
    };
}
