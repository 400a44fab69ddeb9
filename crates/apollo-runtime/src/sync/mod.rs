#![forbid(unsafe_code)]

//! Cross-instance property synchronization.
//!
//! Components that never reference each other share named properties
//! through a [`PropertyChangeRegistry`]:
//!
//! ```text
//! local mutation ──► trigger subscription ──► report_property_changed
//!                                                   │
//!                                     ChangeDedupFilter (value + window)
//!                                                   │
//!                             fan-out in registration order (reporter excluded)
//!                                                   │
//!                          sync method, or direct assignment of the property
//! ```
//!
//! A direct assignment re-triggers the receiving component's own report; the
//! dedup filter sees the same value inside its window and suppresses it,
//! which is what stops two mutually synced components from ping-ponging.
//!
//! [`SyncBinder`] decides which properties of a component participate (an
//! explicit entry list, or a name pattern over declared properties) and
//! returns a [`SyncHandle`] that undoes all of its wiring when dropped.

pub mod binder;
pub mod dedup;
pub mod entry;
pub mod registry;

pub use binder::{
    PATTERN_PROPERTY, SyncBinder, SyncConfigFn, SyncError, SyncHandle, SyncReport, SyncSource,
    SyncStrategy,
};
pub use dedup::{ChangeDedupFilter, LastChangeRecord, Verdict};
pub use entry::{DEFAULT_SYNC_CALLBACK, SyncEntry};
pub use registry::{ChangeCallback, PropertyChangeRegistry, RegistrationId, ReportOutcome};
