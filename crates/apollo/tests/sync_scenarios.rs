//! Cross-component synchronization through a shared context.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use apollo::prelude::*;
use apollo::runtime::ReportOutcome;
use serde_json::{Value, json};

struct Harness {
    clock: ManualClock,
    ctx: ApolloContext,
    def: ComponentDefinition,
}

fn harness(config: ApolloConfig) -> Harness {
    let clock = ManualClock::new();
    let ctx = ApolloContext::with_clock(config, Rc::new(clock.clone()));
    let def = ComponentDefinition::new().with_sync(SyncSource::entries(vec![SyncEntry::new("count")]));
    Harness { clock, ctx, def }
}

fn plain(tag: &str) -> Component {
    Component::builder(tag).property("count", json!(0)).build()
}

/// Component whose sync callback only counts, so it never re-reports.
fn counting(tag: &str) -> (Component, Rc<Cell<u32>>) {
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let component = Component::builder(tag)
        .property("count", json!(0))
        .on_sync("onDataSync", move |_, _, _, _| h.set(h.get() + 1))
        .build();
    (component, hits)
}

#[test]
fn echo_from_receiver_is_suppressed() {
    let h = harness(ApolloConfig::default());
    let (a, a_hits) = counting("a");
    let a = h.ctx.mount(a, &h.def);
    let b = h.ctx.mount(plain("b"), &h.def);

    a.component().set("count", json!(5));

    assert_eq!(b.component().get("count"), Some(json!(5)));
    assert_eq!(a_hits.get(), 0);
    let record = h.ctx.registry().last_change("count").unwrap();
    assert_eq!(record.value, json!(5));
}

#[test]
fn repeat_after_window_notifies_twice() {
    let h = harness(ApolloConfig::default());
    let a = h.ctx.mount(plain("a"), &h.def);
    let (b, b_hits) = counting("b");
    let _b = h.ctx.mount(b, &h.def);

    a.component().set("count", json!(5));
    h.clock.advance_ms(600);
    let again = a.sync().unwrap().push("count");

    assert_eq!(again, Some(ReportOutcome::Delivered { notified: 1 }));
    assert_eq!(b_hits.get(), 2);
}

#[test]
fn repeat_inside_window_notifies_once() {
    let h = harness(ApolloConfig::default());
    let a = h.ctx.mount(plain("a"), &h.def);
    let (b, b_hits) = counting("b");
    let _b = h.ctx.mount(b, &h.def);

    a.component().set("count", json!(5));
    h.clock.advance_ms(100);
    let again = a.sync().unwrap().push("count");

    assert_eq!(again, Some(ReportOutcome::Suppressed));
    assert_eq!(b_hits.get(), 1);
}

#[test]
fn both_directions_converge_without_looping() {
    let h = harness(ApolloConfig::default());
    let a = h.ctx.mount(plain("a"), &h.def);
    let b = h.ctx.mount(plain("b"), &h.def);
    let c = h.ctx.mount(plain("c"), &h.def);

    a.component().set("count", json!(5));
    h.clock.advance_ms(10);
    b.component().set("count", json!(7));

    for m in [&a, &b, &c] {
        assert_eq!(m.component().get("count"), Some(json!(7)));
    }
}

#[test]
fn structured_values_sync_and_dedup() {
    let h = harness(ApolloConfig::default());
    let a = h.ctx.mount(plain("a"), &h.def);
    let (b, b_hits) = counting("b");
    let _b = h.ctx.mount(b, &h.def);

    a.component().set("count", json!({"items": [1, 2], "total": 2}));
    h.clock.advance_ms(50);
    h.ctx.registry().report_property_changed(
        a.component().id(),
        "count",
        &json!({"total": 2, "items": [1, 2]}),
        &Value::Null,
    );
    assert_eq!(b_hits.get(), 1);
}

#[test]
fn unmounted_component_stops_receiving() {
    let h = harness(ApolloConfig::default());
    let a = h.ctx.mount(plain("a"), &h.def);
    let b = h.ctx.mount(plain("b"), &h.def);
    assert_eq!(h.ctx.registry().subscriber_count("count"), 2);

    let b = b.unmount();
    assert_eq!(h.ctx.registry().subscriber_count("count"), 1);

    a.component().set("count", json!(3));
    assert_eq!(b.get("count"), Some(json!(0)));

    b.set("count", json!(9));
    assert_eq!(a.component().get("count"), Some(json!(3)));
}

#[test]
fn contexts_are_isolated() {
    let one = harness(ApolloConfig::default());
    let two = harness(ApolloConfig::default());
    let a = one.ctx.mount(plain("a"), &one.def);
    let b = two.ctx.mount(plain("b"), &two.def);

    a.component().set("count", json!(1));
    assert_eq!(b.component().get("count"), Some(json!(0)));
}

#[test]
fn reporter_notification_is_opt_in() {
    let h = harness(ApolloConfig::default().with_notify_reporter(true));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let a = Component::builder("a")
        .property("count", json!(0))
        .on_sync("onDataSync", move |this, _, new, _| {
            s.borrow_mut().push((this.tag().to_owned(), new.clone()));
        })
        .build();
    let a = h.ctx.mount(a, &h.def);

    a.component().set("count", json!(4));
    assert_eq!(*seen.borrow(), vec![("a".to_owned(), json!(4))]);
}

#[test]
fn global_pattern_through_definition() {
    let clock = ManualClock::new();
    let ctx = ApolloContext::with_clock(
        ApolloConfig::default().with_data_sync_pattern("^shared"),
        Rc::new(clock),
    );
    let def = ComponentDefinition::new().with_sync(SyncSource::inherit());
    let make = |tag: &str| {
        Component::builder(tag)
            .property("sharedFilter", json!(""))
            .property("localPage", json!(1))
            .build()
    };
    let a = ctx.mount(make("a"), &def);
    let b = ctx.mount(make("b"), &def);

    a.component().set("sharedFilter", json!("open"));
    a.component().set("localPage", json!(3));

    assert_eq!(b.component().get("sharedFilter"), Some(json!("open")));
    assert_eq!(b.component().get("localPage"), Some(json!(1)));
    assert_eq!(ctx.registry().properties(), vec!["sharedFilter".to_owned()]);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn bound_instances_converge_after_every_write(
            writes in proptest::collection::vec((0usize..3, -20i64..20, 0u64..900), 1..40)
        ) {
            let h = harness(ApolloConfig::default());
            let mounted: Vec<_> = ["a", "b", "c"]
                .into_iter()
                .map(|tag| h.ctx.mount(plain(tag), &h.def))
                .collect();

            for (writer, value, gap) in writes {
                h.clock.advance_ms(gap);
                mounted[writer].component().set("count", json!(value));
                for m in &mounted {
                    prop_assert_eq!(m.component().get("count"), Some(json!(value)));
                }
            }
        }
    }
}
