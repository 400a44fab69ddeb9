#![no_main]

use apollo_core::casing::{capitalize, kebab_to_camel};
use apollo_events::{EVENT_MARKER, EventDescriptor, EventError, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    match parse(&EventDescriptor::from(data)) {
        Ok(binding) => {
            assert_eq!(binding.event_name, data);
            assert!(binding.handler_fn.is_some() != binding.fire_fn.is_some());
            if let Some(fire_fn) = binding.fire_fn {
                let (_, suffix) = data.split_once(EVENT_MARKER).unwrap();
                assert_eq!(fire_fn, format!("fire{}", capitalize(&kebab_to_camel(suffix))));
            }
        }
        Err(EventError::UnrecognizedConvention(s)) => assert_eq!(s, data),
        Err(EventError::IncompleteBinding { name }) => assert_eq!(name, data),
        Err(other) => panic!("unexpected error for convention string: {other}"),
    }
});
