#![forbid(unsafe_code)]

//! Reactive state primitives for component properties.
//!
//! - [`Observable`]: A shared, version-tracked value wrapper whose
//!   subscribers receive both the new and the previous value.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`BindingScope`]: Collects subscriptions for one logical owner and
//!   releases them together.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. No borrow of the observable is held while subscribers run, so a
//!    subscriber may read or write the observable it is attached to.

pub mod observable;
pub mod scope;

pub use observable::{Observable, Subscription};
pub use scope::BindingScope;
