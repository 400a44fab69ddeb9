#![forbid(unsafe_code)]

//! Event naming convention parser.
//!
//! Pure and stateless. The full descriptor string becomes the event name;
//! the text after the first marker is the kebab-case method stem.

use apollo_core::casing::{capitalize, kebab_to_camel};

use crate::descriptor::{EventBinding, EventDescriptor};
use crate::error::EventError;

/// Marks an event the component fires.
pub const EVENT_MARKER: &str = ":event-";
/// Marks an event the component listens for.
pub const COMMAND_MARKER: &str = ":command-";
/// Prefix of generated emitter names.
pub const FIRE_PREFIX: &str = "fire";

/// Resolve a descriptor into a binding.
///
/// # Errors
///
/// - [`EventError::UnrecognizedConvention`] for strings without a marker.
/// - [`EventError::MissingName`] for explicit descriptors without a name.
/// - [`EventError::IncompleteBinding`] when neither a handler nor an emitter
///   results (including a marker with an empty suffix).
pub fn parse(descriptor: &EventDescriptor) -> Result<EventBinding, EventError> {
    let binding = match descriptor {
        EventDescriptor::Convention(s) => parse_convention(s)?,
        EventDescriptor::Explicit {
            name,
            selector,
            handler_fn,
            fire_fn,
        } => EventBinding {
            event_name: name
                .clone()
                .filter(|n| !n.is_empty())
                .ok_or(EventError::MissingName { index: None })?,
            selector: selector.clone(),
            handler_fn: handler_fn.clone(),
            fire_fn: fire_fn.clone(),
        },
    };

    if binding.handler_fn.is_none() && binding.fire_fn.is_none() {
        return Err(EventError::IncompleteBinding {
            name: binding.event_name,
        });
    }
    Ok(binding)
}

/// Classify a convention string. The `:event-` marker is checked first.
///
/// A recognized marker with an empty suffix yields a binding with neither
/// method; [`parse`] rejects it.
///
/// # Errors
///
/// [`EventError::UnrecognizedConvention`] when no marker is present.
pub fn parse_convention(descriptor: &str) -> Result<EventBinding, EventError> {
    let mut binding = EventBinding {
        event_name: descriptor.to_owned(),
        selector: None,
        handler_fn: None,
        fire_fn: None,
    };

    if let Some((_, suffix)) = descriptor.split_once(EVENT_MARKER) {
        if !suffix.is_empty() {
            binding.fire_fn = Some(format!("{FIRE_PREFIX}{}", capitalize(&kebab_to_camel(suffix))));
        }
    } else if let Some((_, suffix)) = descriptor.split_once(COMMAND_MARKER) {
        if !suffix.is_empty() {
            binding.handler_fn = Some(kebab_to_camel(suffix));
        }
    } else {
        return Err(EventError::UnrecognizedConvention(descriptor.to_owned()));
    }
    Ok(binding)
}
