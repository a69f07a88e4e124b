//! # Propagation Benchmark
//!
//! Target: depth 8 (97,656 parts) propagated well inside a 60 FPS frame.
//!
//! Run with: `cargo bench --package fractalis_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fractalis_core::{FractalHierarchy, HierarchyConfig};
use fractalis_shared::Transform;

/// Benchmark: one frame of propagation per depth.
fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance");

    for depth in [4, 6, 8] {
        let mut hierarchy = FractalHierarchy::initialize(&HierarchyConfig::with_depth(depth))
            .expect("valid depth");
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| hierarchy.advance(black_box(&Transform::IDENTITY), black_box(1.0 / 60.0)));
        });
    }

    group.finish();
}

/// Benchmark: single-item batches versus coarse batches at depth 7.
fn bench_batch_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_size");

    for batch_size in [1, 5, 64, 1024] {
        let config = HierarchyConfig { depth: 7, batch_size, ..HierarchyConfig::default() };
        let mut hierarchy = FractalHierarchy::initialize(&config).expect("valid config");
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch_size, |b, _| {
            b.iter(|| hierarchy.advance(black_box(&Transform::IDENTITY), black_box(1.0 / 60.0)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_advance, bench_batch_size);
criterion_main!(benches);
