//! # Filter Matching Benchmarks
//!
//! Filters are evaluated once per candidate subscription per publish, so
//! matching must stay cheap as groups and `in` lists grow.

use std::time::Duration;

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use shared_types::{AttributeMap, ATTR_NAME, ATTR_ORIGIN_REGION};
use xr_01_filter_engine::{validate, FilterEngine, FilterExpr, FilterGroup, FilterLimits, Predicate};

fn candidate(channel: &str) -> AttributeMap {
    let mut attrs = AttributeMap::new();
    attrs.insert(ATTR_NAME.to_string(), channel.to_string());
    attrs.insert(ATTR_ORIGIN_REGION.to_string(), "us-east-1".to_string());
    attrs
}

/// `groups` groups, each an `in` list of `values` channel names plus an
/// origin check. The candidate matches the last value of every list.
fn wide_filter(groups: usize, values: usize) -> FilterExpr {
    FilterExpr::new(
        (0..groups)
            .map(|_| {
                FilterGroup::any_of(vec![
                    Predicate::eq(ATTR_ORIGIN_REGION, "nowhere"),
                    Predicate::is_in(ATTR_NAME, (0..values).map(|i| format!("channel-{i}"))),
                ])
            })
            .collect(),
    )
}

pub fn bench_scenario_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("xr-01-filter-scenario");
    let filter = FilterExpr::single(Predicate::is_in(ATTR_NAME, ["cars", "robots"]));
    let cars = candidate("cars");
    let music = candidate("music");

    group.bench_function("match_hit", |b| {
        b.iter(|| black_box(FilterEngine::matches(&filter, black_box(&cars))))
    });
    group.bench_function("match_miss", |b| {
        b.iter(|| black_box(FilterEngine::matches(&filter, black_box(&music))))
    });

    group.finish();
}

pub fn bench_wide_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("xr-01-filter-wide");
    group.measurement_time(Duration::from_secs(5));

    for (groups, values) in [(1, 10), (5, 10), (10, 100)] {
        let filter = wide_filter(groups, values);
        let hit = candidate(&format!("channel-{}", values - 1));

        group.throughput(Throughput::Elements(groups as u64));
        group.bench_with_input(
            BenchmarkId::new("worst_case_hit", format!("{groups}x{values}")),
            &filter,
            |b, filter| b.iter(|| black_box(FilterEngine::matches(filter, black_box(&hit)))),
        );
    }

    group.finish();
}

pub fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("xr-01-filter-validation");
    let limits = FilterLimits::default();
    let filter = wide_filter(10, 100);
    let json = filter.to_json();

    group.bench_function("validate_max_size", |b| {
        b.iter(|| black_box(validate(black_box(&filter), &limits).is_ok()))
    });
    group.bench_function("parse_and_validate", |b| {
        b.iter(|| {
            let parsed = FilterExpr::from_json(black_box(&json));
            black_box(parsed.map(|f| validate(&f, &limits).is_ok()))
        })
    });

    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    bench_scenario_filter(c);
    bench_wide_filters(c);
    bench_validation(c);
}
