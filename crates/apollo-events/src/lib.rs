#![forbid(unsafe_code)]

//! Convention-driven event wiring for Apollo components.
//!
//! A component declares the events it takes part in as a list of
//! [`EventDescriptor`]s. Convention strings encode the direction:
//!
//! | Descriptor                     | Binding                                   |
//! |--------------------------------|-------------------------------------------|
//! | `"widget:event-state-change"`  | emitter `fireStateChange(data, target?)`  |
//! | `"widget:command-refresh-now"` | listener calling handler `refreshNow`     |
//!
//! [`parse`] turns a descriptor into an [`EventBinding`];
//! [`EventDispatcher::attach`] wires bindings onto the component's root
//! element and method table, returning an [`EventBindings`] guard that
//! detaches the listeners when dropped. [`fire`] dispatches a named custom
//! event from a component.

pub mod convention;
pub mod descriptor;
pub mod dispatcher;
pub mod error;

pub use convention::{COMMAND_MARKER, EVENT_MARKER, FIRE_PREFIX, parse, parse_convention};
pub use descriptor::{EventBinding, EventDescriptor};
pub use dispatcher::{DispatchReport, EventBindings, EventDispatcher, fire};
pub use error::EventError;
