#![forbid(unsafe_code)]

//! Event descriptors (what a component declares) and bindings (what the
//! dispatcher wires).

use serde_json::Value;

/// One declared event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDescriptor {
    /// `"<tag>:event-<suffix>"` or `"<tag>:command-<suffix>"`.
    Convention(String),
    /// Fully spelled-out binding, used as-is without casing transforms.
    Explicit {
        name: Option<String>,
        selector: Option<String>,
        handler_fn: Option<String>,
        fire_fn: Option<String>,
    },
}

impl EventDescriptor {
    /// Explicit descriptor for `name` with no handler or emitter yet.
    #[must_use]
    pub fn explicit(name: impl Into<String>) -> Self {
        Self::Explicit {
            name: Some(name.into()),
            selector: None,
            handler_fn: None,
            fire_fn: None,
        }
    }

    /// Scope a listener to descendants matching `selector`.
    /// No effect on convention strings.
    #[must_use]
    pub fn with_selector(mut self, value: impl Into<String>) -> Self {
        if let Self::Explicit { selector, .. } = &mut self {
            *selector = Some(value.into());
        }
        self
    }

    /// Name the handler method to call. No effect on convention strings.
    #[must_use]
    pub fn with_handler(mut self, method: impl Into<String>) -> Self {
        if let Self::Explicit { handler_fn, .. } = &mut self {
            *handler_fn = Some(method.into());
        }
        self
    }

    /// Name the emitter method to generate. No effect on convention strings.
    #[must_use]
    pub fn with_emitter(mut self, method: impl Into<String>) -> Self {
        if let Self::Explicit { fire_fn, .. } = &mut self {
            *fire_fn = Some(method.into());
        }
        self
    }

    /// Read a descriptor from a JSON declaration: a string, or an object
    /// with `name`, `selector`, `handlerFn` and `fireFn` keys. Empty strings
    /// count as absent. Any other JSON shape becomes a convention string
    /// that will not parse.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Convention(s.clone()),
            Value::Object(map) => {
                let field = |key: &str| {
                    map.get(key)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                };
                Self::Explicit {
                    name: field("name"),
                    selector: field("selector"),
                    handler_fn: field("handlerFn"),
                    fire_fn: field("fireFn"),
                }
            }
            other => Self::Convention(other.to_string()),
        }
    }

    /// Read a list of descriptors from a JSON array. Non-arrays yield an
    /// empty list.
    #[must_use]
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| items.iter().map(Self::from_value).collect())
            .unwrap_or_default()
    }
}

impl From<&str> for EventDescriptor {
    fn from(s: &str) -> Self {
        Self::Convention(s.to_owned())
    }
}

impl From<String> for EventDescriptor {
    fn from(s: String) -> Self {
        Self::Convention(s)
    }
}

/// A resolved event binding. At least one of `handler_fn` and `fire_fn` is
/// present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    pub event_name: String,
    pub selector: Option<String>,
    pub handler_fn: Option<String>,
    pub fire_fn: Option<String>,
}

impl EventBinding {
    /// Whether the binding attaches a listener.
    #[must_use]
    pub fn is_listener(&self) -> bool {
        self.handler_fn.is_some()
    }

    /// Whether the binding generates an emitter.
    #[must_use]
    pub fn is_emitter(&self) -> bool {
        self.fire_fn.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_fills_explicit_fields() {
        let d = EventDescriptor::explicit("list:select")
            .with_selector(".row")
            .with_handler("onSelect");
        assert_eq!(
            d,
            EventDescriptor::Explicit {
                name: Some("list:select".into()),
                selector: Some(".row".into()),
                handler_fn: Some("onSelect".into()),
                fire_fn: None,
            }
        );
    }

    #[test]
    fn builder_ignores_convention() {
        let d = EventDescriptor::from("a:event-b").with_handler("x");
        assert_eq!(d, EventDescriptor::Convention("a:event-b".into()));
    }

    #[test]
    fn from_json_string_and_object() {
        let list = EventDescriptor::list_from_value(&json!([
            "widget:event-done",
            {"name": "widget:ping", "fireFn": "firePing", "handlerFn": ""},
            {"selector": ".x"}
        ]));
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], EventDescriptor::Convention("widget:event-done".into()));
        assert_eq!(
            list[1],
            EventDescriptor::explicit("widget:ping").with_emitter("firePing")
        );
        assert!(matches!(&list[2], EventDescriptor::Explicit { name: None, .. }));
    }

    #[test]
    fn non_array_yields_nothing() {
        assert!(EventDescriptor::list_from_value(&json!({"a": 1})).is_empty());
    }

    #[test]
    fn binding_direction() {
        let b = EventBinding {
            event_name: "x".into(),
            selector: None,
            handler_fn: None,
            fire_fn: Some("fireX".into()),
        };
        assert!(b.is_emitter());
        assert!(!b.is_listener());
    }
}
