#![forbid(unsafe_code)]

use std::fmt;

/// Non-fatal event wiring failures. Each one skips a single descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// A string descriptor matched neither `:event-` nor `:command-`.
    UnrecognizedConvention(String),
    /// An explicit descriptor has no event name. `index` is its position in
    /// the component's descriptor list, when known.
    MissingName { index: Option<usize> },
    /// Neither a handler nor an emitter could be derived.
    IncompleteBinding { name: String },
    /// The named handler is not a handler method of the component.
    HandlerNotImplemented { method: String },
    /// The emitter name is already taken on the component.
    EmitterCollision { method: String },
    /// The component has no root element to listen on or dispatch from.
    MissingRootElement,
}

impl EventError {
    /// Attach a descriptor position to a [`MissingName`](Self::MissingName)
    /// error. Other variants are returned unchanged.
    #[must_use]
    pub fn at_index(self, index: usize) -> Self {
        match self {
            Self::MissingName { .. } => Self::MissingName { index: Some(index) },
            other => other,
        }
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedConvention(name) => write!(
                f,
                "event name={name} is not recognized; event names must match *:event-* or *:command-*"
            ),
            Self::MissingName { index: Some(index) } => {
                write!(f, "event must provide a name (events index {index})")
            }
            Self::MissingName { index: None } => write!(f, "event must provide a name"),
            Self::IncompleteBinding { name } => {
                write!(f, "event '{name}' must provide either handlerFn or fireFn")
            }
            Self::HandlerNotImplemented { method } => {
                write!(f, "method {method} was not implemented by component but defined in events")
            }
            Self::EmitterCollision { method } => write!(
                f,
                "method {method} was already implemented by component, so the generated emitter is ignored"
            ),
            Self::MissingRootElement => write!(f, "component has no root element"),
        }
    }
}

impl std::error::Error for EventError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_index_only_touches_missing_name() {
        assert_eq!(
            EventError::MissingName { index: None }.at_index(3),
            EventError::MissingName { index: Some(3) }
        );
        let other = EventError::MissingRootElement;
        assert_eq!(other.clone().at_index(3), other);
    }

    #[test]
    fn display_mentions_offender() {
        let msg = EventError::UnrecognizedConvention("widget:toggle".into()).to_string();
        assert!(msg.contains("widget:toggle"));
        let msg = EventError::MissingName { index: Some(2) }.to_string();
        assert!(msg.contains("index 2"));
        let msg = EventError::EmitterCollision {
            method: "fireDone".into(),
        }
        .to_string();
        assert!(msg.starts_with("method fireDone"));
    }
}
