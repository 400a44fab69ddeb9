#![forbid(unsafe_code)]

//! Component handles: a declared property bag plus an explicit method table.
//!
//! A [`Component`] is what the engines operate on. Its shape is fixed when it
//! is built:
//!
//! - **Properties** are declared up front, in order, each backed by an
//!   [`Observable`] holding a JSON value. Property names are enumerable, so
//!   pattern-based sync selection never needs runtime reflection.
//! - **Methods** are named function references of three kinds: sync
//!   callbacks, event handlers and emitters. Emitters may be added after
//!   construction (the event dispatcher synthesizes them), but an existing
//!   name is never overwritten.
//!
//! Handles are cheap `Rc` clones. Method closures receive the component as
//! their first argument, so they never need to capture it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use apollo_core::host::{DomEvent, ElementRef};
use serde_json::Value;

use crate::reactive::Observable;

static COMPONENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique component identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    fn next() -> Self {
        Self(COMPONENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

/// `(component, property, new, old)`
pub type SyncMethod = Rc<dyn Fn(&Component, &str, &Value, &Value)>;
/// `(component, event)`
pub type HandlerMethod = Rc<dyn Fn(&Component, &DomEvent)>;
/// `(component, data, target)`
pub type EmitMethod = Rc<dyn Fn(&Component, Option<Value>, Option<ElementRef>)>;

/// A named entry in a component's method table.
#[derive(Clone)]
pub enum Method {
    /// Receives synchronized property changes.
    Sync(SyncMethod),
    /// Receives DOM events.
    Handler(HandlerMethod),
    /// Fires a DOM event.
    Emit(EmitMethod),
}

impl Method {
    /// Wrap a sync callback.
    pub fn sync(f: impl Fn(&Component, &str, &Value, &Value) + 'static) -> Self {
        Self::Sync(Rc::new(f))
    }

    /// Wrap an event handler.
    pub fn handler(f: impl Fn(&Component, &DomEvent) + 'static) -> Self {
        Self::Handler(Rc::new(f))
    }

    /// Wrap an emitter.
    pub fn emit(f: impl Fn(&Component, Option<Value>, Option<ElementRef>) + 'static) -> Self {
        Self::Emit(Rc::new(f))
    }

    /// Short name of the method kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sync(_) => "sync",
            Self::Handler(_) => "handler",
            Self::Emit(_) => "emit",
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method::{}", self.kind())
    }
}

struct Property {
    name: String,
    value: Observable<Value>,
}

struct ComponentInner {
    id: ComponentId,
    tag: String,
    properties: Vec<Property>,
    methods: RefCell<HashMap<String, Method>>,
    element: Option<ElementRef>,
}

/// Shared handle to a component instance.
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

/// Non-owning component handle, used by callbacks stored outside the
/// component (registry entries, DOM listeners).
#[derive(Clone)]
pub struct WeakComponent {
    inner: Weak<ComponentInner>,
}

impl WeakComponent {
    /// Upgrade to a strong handle if the component is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Component> {
        self.inner.upgrade().map(|inner| Component { inner })
    }
}

impl fmt::Debug for WeakComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakComponent")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Component {
    /// Start building a component with the given tag name.
    #[must_use]
    pub fn builder(tag: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder::new(tag)
    }

    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.inner.id
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// Root host element, if the component is mounted on one.
    #[must_use]
    pub fn element(&self) -> Option<ElementRef> {
        self.inner.element.clone()
    }

    /// Declared property names in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.inner.properties.iter().map(|p| p.name.as_str())
    }

    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Observable backing the named property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Observable<Value>> {
        self.find(name).map(|p| p.value.clone())
    }

    /// Current value of the named property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.find(name).map(|p| p.value.get())
    }

    /// Assign a property. Returns `false` when no such property is declared.
    ///
    /// Assigning an equal value is a no-op and notifies nobody.
    pub fn set(&self, name: &str, value: Value) -> bool {
        match self.find(name) {
            Some(p) => {
                p.value.set(value);
                true
            }
            None => false,
        }
    }

    /// Clone of the named method entry.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<Method> {
        self.inner.methods.borrow().get(name).cloned()
    }

    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.inner.methods.borrow().contains_key(name)
    }

    /// Whether `name` is taken by either a method or a property.
    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.has_method(name) || self.has_property(name)
    }

    /// Add a method unless the name is already taken. Returns whether it was
    /// added.
    pub fn define_method(&self, name: impl Into<String>, method: Method) -> bool {
        let name = name.into();
        if self.has_property(&name) {
            return false;
        }
        let mut methods = self.inner.methods.borrow_mut();
        if methods.contains_key(&name) {
            return false;
        }
        methods.insert(name, method);
        true
    }

    /// Remove a method entry, returning it.
    pub fn remove_method(&self, name: &str) -> Option<Method> {
        self.inner.methods.borrow_mut().remove(name)
    }

    /// Invoke a sync method. Returns `false` if `name` is not a sync method.
    pub fn call_sync(&self, name: &str, property: &str, new: &Value, old: &Value) -> bool {
        match self.method(name) {
            Some(Method::Sync(f)) => {
                f(self, property, new, old);
                true
            }
            _ => false,
        }
    }

    /// Invoke an event handler. Returns `false` if `name` is not a handler.
    pub fn call_handler(&self, name: &str, event: &DomEvent) -> bool {
        match self.method(name) {
            Some(Method::Handler(f)) => {
                f(self, event);
                true
            }
            _ => false,
        }
    }

    /// Invoke an emitter. Returns `false` if `name` is not an emitter.
    pub fn call_emitter(&self, name: &str, data: Option<Value>, target: Option<ElementRef>) -> bool {
        match self.method(name) {
            Some(Method::Emit(f)) => {
                f(self, data, target);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakComponent {
        WeakComponent {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same component.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    fn find(&self, name: &str) -> Option<&Property> {
        self.inner.properties.iter().find(|p| p.name == name)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<String> = self.inner.methods.borrow().keys().cloned().collect();
        methods.sort();
        f.debug_struct("Component")
            .field("id", &self.inner.id)
            .field("tag", &self.inner.tag)
            .field("properties", &self.property_names().collect::<Vec<_>>())
            .field("methods", &methods)
            .finish()
    }
}

/// Builder for [`Component`].
pub struct ComponentBuilder {
    tag: String,
    properties: Vec<Property>,
    methods: HashMap<String, Method>,
    element: Option<ElementRef>,
}

impl ComponentBuilder {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            properties: Vec::new(),
            methods: HashMap::new(),
            element: None,
        }
    }

    /// Declare a property. Re-declaring a name replaces its initial value
    /// and keeps its original position.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, initial: Value) -> Self {
        let name = name.into();
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = Observable::new(initial),
            None => self.properties.push(Property {
                name,
                value: Observable::new(initial),
            }),
        }
        self
    }

    /// Add a method entry (last definition wins at build time).
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, method: Method) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    /// Add a sync callback method.
    #[must_use]
    pub fn on_sync(
        self,
        name: impl Into<String>,
        f: impl Fn(&Component, &str, &Value, &Value) + 'static,
    ) -> Self {
        self.method(name, Method::sync(f))
    }

    /// Add an event handler method.
    #[must_use]
    pub fn handler(
        self,
        name: impl Into<String>,
        f: impl Fn(&Component, &DomEvent) + 'static,
    ) -> Self {
        self.method(name, Method::handler(f))
    }

    /// Mount the component on a host element.
    #[must_use]
    pub fn element(mut self, element: ElementRef) -> Self {
        self.element = Some(element);
        self
    }

    #[must_use]
    pub fn build(self) -> Component {
        Component {
            inner: Rc::new(ComponentInner {
                id: ComponentId::next(),
                tag: self.tag,
                properties: self.properties,
                methods: RefCell::new(self.methods),
                element: self.element,
            }),
        }
    }
}

impl fmt::Debug for ComponentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentBuilder")
            .field("tag", &self.tag)
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}
