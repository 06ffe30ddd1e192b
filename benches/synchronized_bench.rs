//! Benchmark for the synchronized decorators.
//!
//! Compares guarded operations with the same operations on the bare
//! container, and measures contention when several threads share one
//! decorator.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use guarded::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::hint::black_box;
use std::thread;

// =============================================================================
// 1. Guard Overhead
// =============================================================================

fn benchmark_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("insert");

    for size in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("bare_vec", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut numbers = Vec::new();
                for value in 0..size {
                    numbers.push(black_box(value));
                }
                black_box(numbers)
            });
        });

        group.bench_with_input(
            BenchmarkId::new("synchronized_vec", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let numbers = Synchronized::new(Vec::new());
                    for value in 0..size {
                        let _ = numbers.insert(black_box(value));
                    }
                    black_box(numbers)
                });
            },
        );
    }

    group.finish();
}

fn benchmark_map_lookup(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("map_lookup");
    let entries: BTreeMap<u32, u32> = (0..10_000).map(|key| (key, key * 2)).collect();
    let guarded = Synchronized::new(entries.clone());

    group.bench_function("bare_btree_map", |bencher| {
        bencher.iter(|| {
            let mut sum = 0u64;
            for key in (0..10_000).step_by(7) {
                sum += u64::from(*entries.get(&black_box(key)).unwrap_or(&0));
            }
            black_box(sum)
        });
    });

    group.bench_function("synchronized_btree_map", |bencher| {
        bencher.iter(|| {
            let mut sum = 0u64;
            for key in (0..10_000).step_by(7) {
                sum += u64::from(guarded.get(&black_box(key)).unwrap_or(0));
            }
            black_box(sum)
        });
    });

    group.finish();
}

// =============================================================================
// 2. Views
// =============================================================================

fn benchmark_sub_set(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("sub_set");
    let root = Synchronized::new((0..10_000).collect::<BTreeSet<u32>>());

    for width in [10, 1_000] {
        group.bench_with_input(BenchmarkId::new("len", width), &width, |bencher, &width| {
            bencher.iter(|| {
                let view = root.sub_set(black_box(5_000)..5_000 + width).unwrap();
                black_box(view.len())
            });
        });

        group.bench_with_input(
            BenchmarkId::new("to_vec", width),
            &width,
            |bencher, &width| {
                bencher.iter(|| {
                    let view = root.sub_set(black_box(5_000)..5_000 + width).unwrap();
                    black_box(view.to_vec())
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// 3. Contention
// =============================================================================

fn benchmark_contention(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("contention");

    for threads in [1, 2, 4] {
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |bencher, &threads| {
                bencher.iter(|| {
                    let shared = Synchronized::new(Vec::with_capacity(4_000));
                    thread::scope(|scope| {
                        for offset in 0..threads {
                            let shared = &shared;
                            scope.spawn(move || {
                                for value in 0..1_000 {
                                    let _ = shared.insert(value * threads + offset);
                                }
                            });
                        }
                    });
                    black_box(shared.len())
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// Criterion Group and Main
// =============================================================================

criterion_group!(
    benches,
    benchmark_insert,
    benchmark_map_lookup,
    benchmark_sub_set,
    benchmark_contention
);

criterion_main!(benches);
