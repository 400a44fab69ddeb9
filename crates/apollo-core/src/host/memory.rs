#![forbid(unsafe_code)]

//! Headless element tree.
//!
//! # Semantics
//!
//! - Dispatch walks from the target up through its ancestors. At each
//!   element, listeners registered for the event name fire in attachment
//!   order.
//! - A delegated listener (attached with a selector) fires only when one of
//!   the elements strictly between the listening element and the target
//!   (target included) matches the selector.
//! - Selectors are compound simple selectors: an optional tag followed by
//!   any number of `#id` / `.class` parts (`li.row`, `#main`, `.item`).
//!
//! Listener lists are snapshotted before callbacks run, so a listener may
//! attach or detach listeners without disturbing the current dispatch.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::{DomEvent, ElementRef, HostElement, Listener, ListenerId};

struct ListenerEntry {
    id: ListenerId,
    event: String,
    selector: Option<String>,
    callback: Listener,
}

/// In-memory host element.
pub struct MemoryElement {
    this: Weak<MemoryElement>,
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    parent: RefCell<Weak<MemoryElement>>,
    children: RefCell<Vec<Rc<MemoryElement>>>,
    listeners: RefCell<Vec<ListenerEntry>>,
}

impl MemoryElement {
    /// Create a detached element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Rc<Self> {
        Self::with_attrs(tag, None, &[])
    }

    /// Create a detached element with tag, id and classes.
    #[must_use]
    pub fn with_attrs(
        tag: impl Into<String>,
        id: Option<&str>,
        classes: &[&str],
    ) -> Rc<Self> {
        let tag = tag.into().to_ascii_lowercase();
        let id = id.map(str::to_owned);
        let classes = classes.iter().map(|c| (*c).to_owned()).collect();
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            tag,
            id,
            classes,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
        })
    }

    /// Append `child`, detaching it from any previous parent.
    pub fn append_child(&self, child: &Rc<MemoryElement>) {
        if let Some(old) = child.parent() {
            old.children.borrow_mut().retain(|c| !Rc::ptr_eq(c, child));
        }
        *child.parent.borrow_mut() = self.this.clone();
        self.children.borrow_mut().push(Rc::clone(child));
    }

    /// Parent element, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<Rc<MemoryElement>> {
        self.parent.borrow().upgrade()
    }

    /// Snapshot of direct children.
    #[must_use]
    pub fn children(&self) -> Vec<Rc<MemoryElement>> {
        self.children.borrow().clone()
    }

    /// Lower-cased tag name.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// Number of listeners attached directly to this element.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Whether this element matches a compound simple selector.
    #[must_use]
    pub fn matches(&self, selector: &str) -> bool {
        let selector = selector.trim();
        if selector.is_empty() {
            return false;
        }
        selector
            .split(',')
            .any(|alternative| self.matches_compound(alternative.trim()))
    }

    fn matches_compound(&self, compound: &str) -> bool {
        if compound.is_empty() {
            return false;
        }
        let tag_end = compound.find(['#', '.']).unwrap_or(compound.len());
        let tag = &compound[..tag_end];
        if !tag.is_empty() && tag != "*" && !tag.eq_ignore_ascii_case(&self.tag) {
            return false;
        }

        let mut rest = &compound[tag_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return false;
            }
            let ok = match marker {
                '#' => self.id.as_deref() == Some(name),
                _ => self.classes.iter().any(|c| c == name),
            };
            if !ok {
                return false;
            }
            rest = &body[end..];
        }
        true
    }

    fn element_ref(&self) -> Option<ElementRef> {
        self.this.upgrade().map(|rc| rc as ElementRef)
    }

    fn matching_listeners(&self, event: &str) -> Vec<(Option<String>, Listener)> {
        self.listeners
            .borrow()
            .iter()
            .filter(|entry| entry.event == event)
            .map(|entry| (entry.selector.clone(), Rc::clone(&entry.callback)))
            .collect()
    }
}

impl HostElement for MemoryElement {
    fn describe(&self) -> String {
        let mut out = self.tag.clone();
        if let Some(id) = &self.id {
            out.push('#');
            out.push_str(id);
        }
        for class in &self.classes {
            out.push('.');
            out.push_str(class);
        }
        out
    }

    fn add_listener(&self, event: &str, selector: Option<&str>, listener: Listener) -> ListenerId {
        let id = ListenerId::next();
        self.listeners.borrow_mut().push(ListenerEntry {
            id,
            event: event.to_owned(),
            selector: selector.map(str::to_owned),
            callback: listener,
        });
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }

    fn dispatch(&self, event: &str, data: Option<Value>) {
        let Some(target) = self.this.upgrade() else {
            return;
        };
        let target_ref: ElementRef = Rc::clone(&target) as ElementRef;

        // Bubble path: target first, root last.
        let mut path = vec![Rc::clone(&target)];
        while let Some(parent) = path.last().and_then(|el| el.parent()) {
            path.push(parent);
        }

        for (depth, element) in path.iter().enumerate() {
            let listeners = element.matching_listeners(event);
            if listeners.is_empty() {
                continue;
            }
            let Some(current) = element.element_ref() else {
                continue;
            };
            for (selector, callback) in listeners {
                if let Some(selector) = selector {
                    let delegated = path[..depth].iter().any(|below| below.matches(&selector));
                    if !delegated {
                        continue;
                    }
                }
                callback(&DomEvent {
                    name: event.to_owned(),
                    data: data.clone(),
                    target: Rc::clone(&target_ref),
                    current_target: Rc::clone(&current),
                });
            }
        }
    }
}

impl std::fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryElement")
            .field("element", &self.describe())
            .field("children", &self.children.borrow().len())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}
