#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use apollo_core::clock::ManualClock;
use apollo_core::config::ApolloConfig;
use apollo_runtime::{Component, PropertyChangeRegistry, ReportOutcome};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::json;

#[derive(Debug, Arbitrary)]
enum Op {
    Register { owner: u8, property: u8 },
    Report { owner: u8, property: u8, value: u8 },
    Advance { ms: u16 },
    UnregisterOwner { owner: u8 },
}

fuzz_target!(|ops: Vec<Op>| {
    let clock = ManualClock::new();
    let registry = PropertyChangeRegistry::with_clock(&ApolloConfig::default(), Rc::new(clock.clone()));
    let owners: Vec<_> = (0..4).map(|_| Component::builder("fuzz").build().id()).collect();
    let properties = ["a", "b", "c"];
    let hits = Rc::new(Cell::new(0usize));

    for op in ops {
        match op {
            Op::Register { owner, property } => {
                let h = Rc::clone(&hits);
                registry.register_for_property_change(
                    owners[owner as usize % owners.len()],
                    properties[property as usize % properties.len()],
                    move |_, _, _| h.set(h.get() + 1),
                );
            }
            Op::Report { owner, property, value } => {
                let property = properties[property as usize % properties.len()];
                let subscribers = registry.subscriber_count(property);
                let before = hits.get();
                let outcome = registry.report_property_changed(
                    owners[owner as usize % owners.len()],
                    property,
                    &json!(value % 4),
                    &json!(null),
                );
                match outcome {
                    ReportOutcome::NoSubscribers => assert_eq!(subscribers, 0),
                    ReportOutcome::Suppressed => assert_eq!(hits.get(), before),
                    ReportOutcome::Delivered { notified } => {
                        assert!(notified <= subscribers);
                        assert_eq!(hits.get(), before + notified);
                    }
                }
            }
            Op::Advance { ms } => clock.advance_ms(u64::from(ms)),
            Op::UnregisterOwner { owner } => {
                registry.unregister_owner(owners[owner as usize % owners.len()]);
            }
        }
        for property in properties {
            assert_eq!(
                registry.last_change(property).is_some(),
                registry.subscriber_count(property) > 0
            );
        }
    }
});
