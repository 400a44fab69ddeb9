#![forbid(unsafe_code)]

//! Reactive component state and property synchronization for Apollo.
//!
//! - [`reactive`]: [`Observable`] values with old/new change notification,
//!   RAII [`Subscription`]s, and [`BindingScope`] for grouping them.
//! - [`component`]: [`Component`], a handle over a declared property bag and
//!   an explicit method table.
//! - [`sync`]: the property change registry, its dedup filter, and the
//!   binder that wires components into it.

pub mod component;
pub mod reactive;
pub mod sync;

pub use component::{
    Component, ComponentBuilder, ComponentId, EmitMethod, HandlerMethod, Method, SyncMethod,
    WeakComponent,
};
pub use reactive::{BindingScope, Observable, Subscription};
pub use sync::{
    ChangeCallback, ChangeDedupFilter, DEFAULT_SYNC_CALLBACK, LastChangeRecord,
    PATTERN_PROPERTY, PropertyChangeRegistry, RegistrationId, ReportOutcome, SyncBinder,
    SyncEntry, SyncError, SyncHandle, SyncReport, SyncSource, SyncStrategy, Verdict,
};
