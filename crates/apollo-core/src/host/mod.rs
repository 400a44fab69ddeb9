#![forbid(unsafe_code)]

//! Host element abstraction.
//!
//! The event engine never touches a concrete DOM. It talks to a
//! [`HostElement`]: something that can hold listeners (optionally delegated
//! to descendants matching a selector) and dispatch named custom events
//! carrying a JSON payload.
//!
//! [`MemoryElement`] is a headless implementation with bubbling and
//! delegation, used by tests and by hosts that run without a browser.

mod memory;

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

pub use memory::MemoryElement;

/// Shared handle to a host element.
pub type ElementRef = Rc<dyn HostElement>;

/// Callback invoked when a matching event reaches a listening element.
pub type Listener = Rc<dyn Fn(&DomEvent)>;

static LISTENER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier of one attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocate a fresh, process-unique listener id.
    #[must_use]
    pub fn next() -> Self {
        Self(LISTENER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A custom event delivered to a listener.
#[derive(Clone)]
pub struct DomEvent {
    /// Event name.
    pub name: String,
    /// Payload carried by the event, if any.
    pub data: Option<Value>,
    /// Element the event was dispatched on.
    pub target: ElementRef,
    /// Element the listener is attached to.
    pub current_target: ElementRef,
}

impl fmt::Debug for DomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomEvent")
            .field("name", &self.name)
            .field("data", &self.data)
            .field("target", &self.target.describe())
            .field("current_target", &self.current_target.describe())
            .finish()
    }
}

/// Element capable of holding listeners and dispatching custom events.
pub trait HostElement {
    /// Short selector-like description (`tag#id.class`) for diagnostics.
    fn describe(&self) -> String;

    /// Attach `listener` for `event`. With a `selector`, the listener fires
    /// only for events that originate at or pass through a descendant
    /// matching it.
    fn add_listener(&self, event: &str, selector: Option<&str>, listener: Listener) -> ListenerId;

    /// Detach a listener. Returns `false` if it was not attached here.
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Dispatch `event` with `data` on this element.
    fn dispatch(&self, event: &str, data: Option<Value>);
}

impl fmt::Debug for dyn HostElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
