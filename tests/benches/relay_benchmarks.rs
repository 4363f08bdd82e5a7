//! # Relay Benchmarks
//!
//! | Path | Expectation |
//! |------|-------------|
//! | Filter match, scenario filter | tens of nanoseconds |
//! | Filter match, 10 groups x 100 values | linear in predicates |
//! | Registry query | tracks bucket size, not registry size |

use criterion::{criterion_group, criterion_main, Criterion};
use xr_tests::benchmarks::{filter_matching, registry_query};

fn bench_filter_matching(c: &mut Criterion) {
    filter_matching::register_benchmarks(c);
}

fn bench_registry_query(c: &mut Criterion) {
    registry_query::register_benchmarks(c);
}

criterion_group!(benches, bench_filter_matching, bench_registry_query);
criterion_main!(benches);
