#![forbid(unsafe_code)]

//! Property change registry: ordered fan-out keyed by property name.
//!
//! The registry is an explicit service object. Every component that takes
//! part in synchronization receives a clone of the same handle (clones share
//! state), and removes its registrations on teardown.
//!
//! # Invariants
//!
//! 1. Fan-out for one report runs in registration order and completes before
//!    `report_property_changed` returns.
//! 2. The reporting owner is excluded from its own fan-out unless the
//!    registry was configured with `notify_reporter`. Exclusion compares the
//!    owner stored on each registration.
//! 3. Reports for a property with no registrations are no-ops: no callback,
//!    no dedup record.
//! 4. The dedup record is updated **before** fan-out, so a subscriber that
//!    re-reports the same value from inside its callback is suppressed.
//! 5. No internal borrow is held while callbacks run; callbacks may
//!    register, unregister or report re-entrantly.
//! 6. Removing the last registration for a property drops its list and its
//!    dedup record.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use apollo_core::clock::{SharedClock, SystemClock};
use apollo_core::config::ApolloConfig;
use apollo_core::logging::SYNC_TARGET;
use serde_json::Value;

use super::dedup::{ChangeDedupFilter, LastChangeRecord, Verdict};
use crate::component::ComponentId;

static REGISTRATION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

impl RegistrationId {
    fn next() -> Self {
        Self(REGISTRATION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// `(property, new, old)`
pub type ChangeCallback = Rc<dyn Fn(&str, &Value, &Value)>;

/// What happened to one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Nobody is registered for the property.
    NoSubscribers,
    /// Same value inside the dedup window.
    Suppressed,
    /// Fan-out ran; `notified` callbacks were invoked.
    Delivered { notified: usize },
}

struct WatcherRegistration {
    id: RegistrationId,
    owner: ComponentId,
    callback: ChangeCallback,
}

struct RegistryState {
    watchers: HashMap<String, Vec<WatcherRegistration>>,
    dedup: ChangeDedupFilter,
}

/// Shared handle to a property change registry.
#[derive(Clone)]
pub struct PropertyChangeRegistry {
    state: Rc<RefCell<RegistryState>>,
    clock: SharedClock,
    notify_reporter: bool,
}

impl PropertyChangeRegistry {
    /// Registry using the platform clock.
    #[must_use]
    pub fn new(config: &ApolloConfig) -> Self {
        Self::with_clock(config, Rc::new(SystemClock))
    }

    /// Registry measuring its dedup window against `clock`.
    #[must_use]
    pub fn with_clock(config: &ApolloConfig, clock: SharedClock) -> Self {
        Self {
            state: Rc::new(RefCell::new(RegistryState {
                watchers: HashMap::new(),
                dedup: ChangeDedupFilter::new(
                    config.dedup_window,
                    config.suppressed_report_policy,
                ),
            })),
            clock,
            notify_reporter: config.notify_reporter,
        }
    }

    /// Append a callback to the fan-out list for `property`.
    ///
    /// The same owner may register several callbacks for one property.
    pub fn register_for_property_change(
        &self,
        owner: ComponentId,
        property: &str,
        callback: impl Fn(&str, &Value, &Value) + 'static,
    ) -> RegistrationId {
        let id = RegistrationId::next();
        let mut state = self.state.borrow_mut();
        state.dedup.track(property);
        state
            .watchers
            .entry(property.to_owned())
            .or_default()
            .push(WatcherRegistration {
                id,
                owner,
                callback: Rc::new(callback),
            });
        tracing::trace!(target: SYNC_TARGET, %owner, property, "registered for property change");
        id
    }

    /// Report that `owner` changed `property` from `old` to `new`.
    pub fn report_property_changed(
        &self,
        owner: ComponentId,
        property: &str,
        new: &Value,
        old: &Value,
    ) -> ReportOutcome {
        let callbacks: Vec<ChangeCallback> = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let Some(list) = state.watchers.get(property) else {
                return ReportOutcome::NoSubscribers;
            };
            let targets = list
                .iter()
                .filter(|reg| self.notify_reporter || reg.owner != owner)
                .map(|reg| Rc::clone(&reg.callback))
                .collect();

            if state.dedup.admit(property, new, self.clock.now()) == Verdict::Suppress {
                tracing::debug!(
                    target: SYNC_TARGET,
                    %owner,
                    property,
                    "ignoring the data sync event since it is the same data in short period of time"
                );
                return ReportOutcome::Suppressed;
            }
            targets
        };

        for callback in &callbacks {
            callback(property, new, old);
        }
        ReportOutcome::Delivered {
            notified: callbacks.len(),
        }
    }

    /// Remove one registration. Returns whether it existed.
    pub fn unregister(&self, id: RegistrationId) -> bool {
        let mut state = self.state.borrow_mut();
        let mut emptied = None;
        let mut found = false;
        for (property, list) in &mut state.watchers {
            let before = list.len();
            list.retain(|reg| reg.id != id);
            if list.len() != before {
                found = true;
                if list.is_empty() {
                    emptied = Some(property.clone());
                }
                break;
            }
        }
        if let Some(property) = emptied {
            state.watchers.remove(&property);
            state.dedup.forget(&property);
        }
        found
    }

    /// Remove every registration held by `owner`. Returns how many were
    /// removed.
    pub fn unregister_owner(&self, owner: ComponentId) -> usize {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let mut removed = 0;
        let mut emptied = Vec::new();
        for (property, list) in &mut state.watchers {
            let before = list.len();
            list.retain(|reg| reg.owner != owner);
            removed += before - list.len();
            if list.is_empty() {
                emptied.push(property.clone());
            }
        }
        for property in emptied {
            state.watchers.remove(&property);
            state.dedup.forget(&property);
        }
        if removed > 0 {
            tracing::debug!(target: SYNC_TARGET, %owner, removed, "unregistered owner");
        }
        removed
    }

    /// Number of registrations for `property`.
    #[must_use]
    pub fn subscriber_count(&self, property: &str) -> usize {
        self.state
            .borrow()
            .watchers
            .get(property)
            .map_or(0, Vec::len)
    }

    /// Number of registrations across all properties.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.state.borrow().watchers.values().map(Vec::len).sum()
    }

    /// Registered property names, sorted.
    #[must_use]
    pub fn properties(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.borrow().watchers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot of the dedup record for `property`.
    #[must_use]
    pub fn last_change(&self, property: &str) -> Option<LastChangeRecord> {
        self.state.borrow().dedup.record(property).cloned()
    }

    /// Whether two handles share the same registry state.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.state, &b.state)
    }
}

impl fmt::Debug for PropertyChangeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("PropertyChangeRegistry")
            .field("properties", &state.watchers.len())
            .field(
                "registrations",
                &state.watchers.values().map(Vec::len).sum::<usize>(),
            )
            .field("window", &state.dedup.window())
            .field("notify_reporter", &self.notify_reporter)
            .finish()
    }
}
