//! Battle benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skirmish_core::search::{search_min_boost, SearchConfig};
use skirmish_core::simulation::simulate;
use skirmish_test_utils::fixtures::{OPEN_FIELD, OPENING_SKIRMISH, REFERENCE_BATTLES};

/// Plain simulation of every reference battle.
pub fn simulation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");
    for reference in REFERENCE_BATTLES {
        let scenario = reference.scenario();
        group.bench_with_input(
            BenchmarkId::from_parameter(reference.name),
            &scenario,
            |b, scenario| b.iter(|| simulate(black_box(scenario))),
        );
    }
    group.finish();
}

/// Boost search on a quick and a slow reference battle.
pub fn search_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_min_boost");
    group.sample_size(20);
    for reference in [OPENING_SKIRMISH, OPEN_FIELD] {
        let scenario = reference.scenario();
        group.bench_with_input(
            BenchmarkId::from_parameter(reference.name),
            &scenario,
            |b, scenario| b.iter(|| search_min_boost(black_box(scenario), &SearchConfig::default())),
        );
    }
    group.finish();
}

criterion_group!(benches, simulation_benchmark, search_benchmark);
criterion_main!(benches);
