//! # Registry Query Benchmarks
//!
//! `query_matching` only evaluates the exact-channel bucket and the wildcard
//! bucket, so its cost should track those buckets, not the registry size.

use std::sync::Arc;

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use shared_types::{Message, RegionId, ATTR_NAME};
use xr_01_filter_engine::{ChannelSelector, FilterExpr, Predicate};
use xr_02_subscription_registry::{RecordingSink, Subscription, SubscriptionRegistry};

const CHANNELS: usize = 100;

/// `size` subscriptions spread over [`CHANNELS`] channels, plus one
/// wildcard subscription per hundred.
fn populated(size: usize) -> SubscriptionRegistry {
    let region = RegionId::new("us-east-1");
    let registry = SubscriptionRegistry::new(region.clone());
    let sink = Arc::new(RecordingSink::new());

    for i in 0..size {
        let selector = if i % 100 == 0 {
            ChannelSelector::Any
        } else {
            ChannelSelector::exact(format!("channel-{}", i % CHANNELS))
        };
        let subscription = Subscription::new(selector, sink.clone(), region.clone())
            .with_filter(FilterExpr::single(Predicate::is_in(
                ATTR_NAME,
                [format!("channel-{}", i % CHANNELS), "cars".to_string()],
            )))
            .with_invalidation_filter(FilterExpr::single(Predicate::eq("tenant", format!("t{i}"))));
        assert!(registry.add(subscription).is_ok(), "generated ids are unique");
    }
    registry
}

pub fn bench_query_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("xr-02-registry-query");

    for size in [1_000, 10_000, 50_000] {
        let registry = populated(size);
        let message = Message::new("channel-7", "payload", RegionId::new("us-east-1"));

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("query_matching", size), &registry, |b, r| {
            b.iter(|| black_box(r.query_matching(black_box(&message)).count()))
        });
    }

    group.finish();
}

pub fn bench_invalidation_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("xr-02-registry-invalidation");
    let registry = populated(10_000);
    let mut args = shared_types::AttributeMap::new();
    args.insert("tenant".to_string(), "t42".to_string());

    group.bench_function("query_invalidation_matches_10k", |b| {
        b.iter(|| black_box(registry.query_invalidation_matches(black_box(&args)).count()))
    });

    group.finish();
}

pub fn bench_add_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("xr-02-registry-churn");
    let registry = populated(10_000);
    let region = RegionId::new("us-east-1");
    let sink = Arc::new(RecordingSink::new());

    group.bench_function("add_then_remove", |b| {
        b.iter(|| {
            let subscription = Subscription::new(
                ChannelSelector::exact("cars"),
                sink.clone(),
                region.clone(),
            );
            let id = subscription.id.clone();
            let added = registry.add(subscription).is_ok();
            black_box((added, registry.remove(&id).is_some()))
        })
    });

    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    bench_query_matching(c);
    bench_invalidation_scan(c);
    bench_add_remove(c);
}
