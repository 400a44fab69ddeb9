//! Benchmarks for registry fan-out, dedup suppression and bound sync chains.
//!
//! Run with: cargo bench -p apollo-runtime --bench fanout_bench

use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use apollo_core::clock::ManualClock;
use apollo_core::config::ApolloConfig;
use apollo_runtime::{Component, PropertyChangeRegistry, SyncBinder, SyncSource};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};

fn registry_with(subscribers: usize) -> (PropertyChangeRegistry, Rc<Cell<u64>>) {
    let config = ApolloConfig::default();
    let registry = PropertyChangeRegistry::with_clock(&config, Rc::new(ManualClock::new()));
    let hits = Rc::new(Cell::new(0));
    for _ in 0..subscribers {
        let owner = Component::builder("sub").build().id();
        let h = Rc::clone(&hits);
        registry.register_for_property_change(owner, "count", move |_, _, _| {
            h.set(h.get() + 1);
        });
    }
    (registry, hits)
}

fn bench_fanout_delivered(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry/delivered");
    let reporter = Component::builder("reporter").build().id();

    for n in [1usize, 8, 64, 512] {
        group.throughput(Throughput::Elements(n as u64));
        let (registry, _hits) = registry_with(n);
        let mut next = 0u64;
        group.bench_with_input(BenchmarkId::new("report", n), &(), |b, _| {
            b.iter(|| {
                next += 1;
                black_box(registry.report_property_changed(
                    reporter,
                    "count",
                    &json!(next),
                    &Value::Null,
                ))
            });
        });
    }

    group.finish();
}

fn bench_fanout_suppressed(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry/suppressed");
    let reporter = Component::builder("reporter").build().id();

    for (label, value) in [
        ("scalar", json!(5)),
        ("object", json!({"items": [1, 2, 3], "page": {"index": 4, "size": 20}})),
    ] {
        let (registry, _hits) = registry_with(64);
        registry.report_property_changed(reporter, "count", &value, &Value::Null);
        let same = value.clone();
        group.bench_with_input(BenchmarkId::new("report", label), &(), |b, _| {
            b.iter(|| {
                black_box(registry.report_property_changed(
                    reporter,
                    "count",
                    &same,
                    &Value::Null,
                ))
            });
        });
    }

    group.finish();
}

fn bench_bound_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("binder/set_propagates");
    let config = ApolloConfig::default();

    for n in [2usize, 16, 128] {
        let registry = PropertyChangeRegistry::with_clock(&config, Rc::new(ManualClock::new()));
        let binder = SyncBinder::new(registry, &config);
        let source = SyncSource::pattern("^count$");
        let components: Vec<Component> = (0..n)
            .map(|_| Component::builder("peer").property("count", json!(0)).build())
            .collect();
        let _handles: Vec<_> = components.iter().map(|c| binder.bind(c, &source)).collect();

        group.throughput(Throughput::Elements(n as u64));
        let mut next = 0u64;
        group.bench_with_input(BenchmarkId::new("set", n), &(), |b, _| {
            b.iter(|| {
                next += 1;
                black_box(components[0].set("count", json!(next)))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_fanout_delivered,
    bench_fanout_suppressed,
    bench_bound_chain
);
criterion_main!(benches);
