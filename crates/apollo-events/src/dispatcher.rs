#![forbid(unsafe_code)]

//! Event dispatcher: attach listeners, synthesize emitters, fire events.

use std::fmt;
use std::rc::Rc;

use apollo_core::host::{DomEvent, ElementRef, HostElement, ListenerId};
use apollo_core::logging::EVENTS_TARGET;
use apollo_core::value::describe_payload;
use apollo_runtime::component::{Component, Method, WeakComponent};
use serde_json::Value;

use crate::convention::parse;
use crate::descriptor::{EventBinding, EventDescriptor};
use crate::error::EventError;

/// Fire `name` with `data` from `component`.
///
/// The event is dispatched on `target` when given, otherwise on the
/// component's root element. The payload is serialized for the debug log
/// only; serialization problems never stop the dispatch.
///
/// # Errors
///
/// [`EventError::MissingRootElement`] when there is no target and the
/// component has no root element.
pub fn fire(
    component: &Component,
    name: &str,
    data: Option<Value>,
    target: Option<ElementRef>,
) -> Result<(), EventError> {
    tracing::debug!(
        target: EVENTS_TARGET,
        component = %component.id(),
        "firing event {name} with data={}",
        describe_payload(data.as_ref())
    );
    let element = target
        .or_else(|| component.element())
        .ok_or(EventError::MissingRootElement)?;
    element.dispatch(name, data);
    Ok(())
}

/// What [`EventDispatcher::attach`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Bindings that were wired (listener, emitter, or both).
    pub attached: Vec<EventBinding>,
    /// Emitter methods added to the component.
    pub generated: Vec<String>,
    /// Failures, in descriptor order.
    pub skipped: Vec<EventError>,
}

/// Stateless wiring of event bindings onto components.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDispatcher;

impl EventDispatcher {
    /// Parse and wire every descriptor.
    ///
    /// Malformed or unsatisfiable descriptors are logged at `warn` and
    /// skipped; the rest are still wired. Listeners and generated emitters
    /// are removed when the returned guard drops.
    pub fn attach(component: &Component, descriptors: &[EventDescriptor]) -> EventBindings {
        let mut bindings = EventBindings {
            component: component.downgrade(),
            listeners: Vec::new(),
            emitters: Vec::new(),
            report: DispatchReport::default(),
        };

        if descriptors.is_empty() {
            tracing::debug!(
                target: EVENTS_TARGET,
                component = %component.id(),
                "no events were defined"
            );
            return bindings;
        }

        for (index, descriptor) in descriptors.iter().enumerate() {
            match parse(descriptor).map_err(|err| err.at_index(index)) {
                Ok(binding) => Self::wire(component, binding, &mut bindings),
                Err(err) => bindings.skip(component, err),
            }
        }
        bindings
    }

    fn wire(component: &Component, binding: EventBinding, bindings: &mut EventBindings) {
        if let Some(handler_fn) = &binding.handler_fn {
            let handler = match component.method(handler_fn) {
                Some(Method::Handler(handler)) => handler,
                _ => {
                    bindings.skip(
                        component,
                        EventError::HandlerNotImplemented {
                            method: handler_fn.clone(),
                        },
                    );
                    return;
                }
            };
            let Some(root) = component.element() else {
                bindings.skip(component, EventError::MissingRootElement);
                return;
            };
            let weak = component.downgrade();
            let id = root.add_listener(
                &binding.event_name,
                binding.selector.as_deref(),
                Rc::new(move |event: &DomEvent| {
                    if let Some(this) = weak.upgrade() {
                        handler(&this, event);
                    }
                }),
            );
            bindings.listeners.push((root, id));
        }

        if let Some(fire_fn) = &binding.fire_fn {
            if component.has_member(fire_fn) {
                bindings.skip(
                    component,
                    EventError::EmitterCollision {
                        method: fire_fn.clone(),
                    },
                );
                return;
            }
            let name = binding.event_name.clone();
            component.define_method(
                fire_fn.clone(),
                Method::emit(move |this, data, target| {
                    if let Err(err) = fire(this, &name, data, target) {
                        tracing::warn!(target: EVENTS_TARGET, component = %this.id(), "{err}");
                    }
                }),
            );
            bindings.emitters.push(fire_fn.clone());
            bindings.report.generated.push(fire_fn.clone());
        }

        bindings.report.attached.push(binding);
    }
}

/// Listeners and emitters added by one [`EventDispatcher::attach`] call.
///
/// Dropping the guard (or calling [`detach`](Self::detach)) removes them, so
/// attaching the same declarations again starts from a clean component.
#[must_use = "dropping EventBindings immediately detaches its listeners"]
pub struct EventBindings {
    component: WeakComponent,
    listeners: Vec<(ElementRef, ListenerId)>,
    emitters: Vec<String>,
    report: DispatchReport,
}

impl EventBindings {
    #[must_use]
    pub fn report(&self) -> &DispatchReport {
        &self.report
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Remove all listeners and generated emitters now. Idempotent.
    pub fn detach(&mut self) {
        for (element, id) in self.listeners.drain(..) {
            element.remove_listener(id);
        }
        let Some(component) = self.component.upgrade() else {
            self.emitters.clear();
            return;
        };
        for name in self.emitters.drain(..) {
            component.remove_method(&name);
        }
    }

    fn skip(&mut self, component: &Component, err: EventError) {
        tracing::warn!(
            target: EVENTS_TARGET,
            component = %component.id(),
            tag = component.tag(),
            "{err}"
        );
        self.report.skipped.push(err);
    }
}

impl Drop for EventBindings {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for EventBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBindings")
            .field("listeners", &self.listeners.len())
            .field("emitters", &self.emitters)
            .field("report", &self.report)
            .finish()
    }
}
