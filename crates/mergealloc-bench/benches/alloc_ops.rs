//! Criterion micro-benchmarks for allocate, deallocate, and the best-fit scan.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use mergealloc::{HeapArena, MergeAllocator};
use mergealloc_bench::{fragment, generate, replay, WorkloadProfile};

/// Benchmark: allocate then free one block on an otherwise empty 64 KiB arena.
fn bench_alloc_free_cycle(c: &mut Criterion) {
    let mut arena = HeapArena::new(64 * 1024);
    let mut alloc = MergeAllocator::new(&mut arena);
    c.bench_function("alloc_free_cycle", |b| {
        b.iter(|| {
            let addr = alloc.allocate(black_box(100)).unwrap();
            alloc.deallocate(addr, 100);
        });
    });
}

/// Benchmark: best-fit scan over ~680 equal holes, request fits none exactly.
fn bench_best_fit_scan(c: &mut Criterion) {
    let mut arena = HeapArena::new(64 * 1024);
    let mut alloc = MergeAllocator::new(&mut arena);
    let _live = fragment(&mut alloc, 48);
    c.bench_function("best_fit_scan_fragmented", |b| {
        b.iter(|| {
            // No exact fit, so the scan visits every hole before splitting one.
            let addr = alloc.allocate(black_box(32)).unwrap();
            alloc.deallocate(addr, 32);
        });
    });
}

/// Benchmark: free into the middle of a long list, merging both sides.
fn bench_coalesce_both(c: &mut Criterion) {
    let mut arena = HeapArena::new(64 * 1024);
    let mut alloc = MergeAllocator::new(&mut arena);
    let live = fragment(&mut alloc, 32);
    let middle = live[live.len() / 2];
    c.bench_function("coalesce_both_neighbours", |b| {
        b.iter(|| {
            alloc.deallocate(black_box(middle), 32);
            // The merged 96-byte block is the only fit; free its outer
            // thirds to restore hole, live, hole.
            let merged = alloc.allocate(96).unwrap();
            alloc.deallocate(merged, 32);
            alloc.deallocate(merged + 64, 32);
        });
    });
}

/// Benchmark: replay 10K seeded churn ops on a 64 KiB arena.
fn bench_churn_10k(c: &mut Criterion) {
    let ops = generate(&WorkloadProfile::churn(), 42);
    c.bench_function("churn_10k", |b| {
        b.iter(|| {
            let mut arena = HeapArena::new(64 * 1024);
            let mut alloc = MergeAllocator::new(&mut arena);
            black_box(replay(&mut alloc, &ops));
        });
    });
}

/// Benchmark: replay 10K seeded small-object ops on a 16 KiB arena.
fn bench_small_objects_10k(c: &mut Criterion) {
    let ops = generate(&WorkloadProfile::small_objects(), 42);
    c.bench_function("small_objects_10k", |b| {
        b.iter(|| {
            let mut arena = HeapArena::new(16 * 1024);
            let mut alloc = MergeAllocator::new(&mut arena);
            black_box(replay(&mut alloc, &ops));
        });
    });
}

criterion_group!(
    benches,
    bench_alloc_free_cycle,
    bench_best_fit_scan,
    bench_coalesce_both,
    bench_churn_10k,
    bench_small_objects_10k
);
criterion_main!(benches);
