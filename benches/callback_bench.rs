//! Benchmark for the iterative callbacks.
//!
//! Measures the stock callbacks against hand-written iterator code, and the
//! benefit of stopping early.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use guarded::prelude::*;
use std::hint::black_box;

// =============================================================================
// 1. Full Traversals
// =============================================================================

fn benchmark_maximum(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("maximum");

    for size in [100, 10_000] {
        let numbers: Vec<i64> = (0..size).map(|value| (value * 7919) % 1_013).collect();

        group.bench_with_input(BenchmarkId::new("iterator", size), &numbers, |bencher, numbers| {
            bencher.iter(|| black_box(numbers.iter().copied().max()));
        });

        group.bench_with_input(
            BenchmarkId::new("maximum_retriever", size),
            &numbers,
            |bencher, numbers| {
                bencher.iter(|| {
                    let mut maximum = MaximumRetriever::new();
                    black_box(maximum.iterate(black_box(numbers)).cloned())
                });
            },
        );
    }

    group.finish();
}

fn benchmark_selector(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("selector");
    let numbers = Synchronized::new((0..10_000).collect::<Vec<u32>>());

    group.bench_function("to_vec", |bencher| {
        bencher.iter(|| black_box(numbers.to_vec()));
    });

    group.bench_function("selector", |bencher| {
        bencher.iter(|| {
            let mut selector = Selector::new();
            black_box(selector.iterate(&numbers).map(Vec::len))
        });
    });

    group.finish();
}

// =============================================================================
// 2. Early Exit
// =============================================================================

fn benchmark_has_less_than(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("has_less_than");
    let numbers: Vec<u32> = (0..100_000).collect();

    for bound in [1, 100, 10_000] {
        group.bench_with_input(BenchmarkId::new("bounded", bound), &bound, |bencher, &bound| {
            bencher.iter(|| {
                let checked = HasLessThan::new(black_box(bound)).iterate(&numbers);
                black_box(checked.and_then(|checked| checked.has_less()))
            });
        });

        group.bench_with_input(BenchmarkId::new("full_count", bound), &bound, |bencher, &bound| {
            bencher.iter(|| {
                let count = Count::new().iterate(&numbers).copied();
                black_box(count.map(|count| count < black_box(bound)))
            });
        });
    }

    group.finish();
}

fn benchmark_fold_until(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("fold_until");
    let numbers: Vec<u64> = (0..10_000).collect();

    for limit in [1_000u64, 1_000_000] {
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |bencher, &limit| {
            bencher.iter(|| {
                black_box(fold_until(&numbers, 0u64, |sum, value| {
                    let sum = sum + value;
                    if sum > limit {
                        Step::Stop(sum)
                    } else {
                        Step::Continue(sum)
                    }
                }))
            });
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Group and Main
// =============================================================================

criterion_group!(
    benches,
    benchmark_maximum,
    benchmark_selector,
    benchmark_has_less_than,
    benchmark_fold_until
);

criterion_main!(benches);
