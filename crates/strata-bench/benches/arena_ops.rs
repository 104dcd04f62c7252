//! Criterion micro-benchmarks comparing arena, recycling arena and global
//! allocation for container workloads.

use std::hint::black_box;

use allocator_api2::alloc::{Allocator, Global};
use allocator_api2::boxed::Box;
use allocator_api2::vec::Vec;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_arena::{ArenaAlloc, HeapSource, RecycleAlloc};
use strata_bench::{scattered_keys, Profile, PROFILES};
use strata_test_utils::run_churn;

fn arena(p: &Profile) -> ArenaAlloc<u8> {
    ArenaAlloc::try_with_source(&p.config(), HeapSource).unwrap()
}

fn recycling(p: &Profile) -> RecycleAlloc<u8> {
    RecycleAlloc::try_with_source(&p.config(), HeapSource).unwrap()
}

fn push_all<A: Allocator>(alloc: A, items: u64) -> u64 {
    let mut v = Vec::new_in(alloc);
    for i in 0..items {
        v.push(i);
    }
    v.iter().sum()
}

/// Benchmark: grow a `Vec<u64>` to `items` elements, one push at a time.
fn bench_vec_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("vec_push");
    for p in &PROFILES {
        group.bench_with_input(BenchmarkId::new("arena", p.name), p, |b, p| {
            b.iter(|| black_box(push_all(arena(p), p.items)));
        });
        group.bench_with_input(BenchmarkId::new("recycle", p.name), p, |b, p| {
            b.iter(|| black_box(push_all(recycling(p), p.items)));
        });
    }
    group.bench_function("global", |b| {
        b.iter(|| black_box(push_all(Global, PROFILES[0].items)));
    });
    group.finish();
}

/// Benchmark: the insert/erase churn workload, arena torn down each iteration.
fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");
    for p in &PROFILES {
        group.bench_with_input(BenchmarkId::new("arena", p.name), p, |b, p| {
            b.iter(|| black_box(run_churn(&arena(p), p.items, |_| {})));
        });
        group.bench_with_input(BenchmarkId::new("recycle", p.name), p, |b, p| {
            b.iter(|| black_box(run_churn(&recycling(p), p.items, |_| {})));
        });
    }
    group.bench_function("global", |b| {
        b.iter(|| black_box(run_churn(&Global, PROFILES[0].items, |_| {})));
    });
    group.finish();
}

fn box_and_release<A: Allocator + Clone>(alloc: &A, keys: &[u64]) -> u64 {
    let mut boxes: std::vec::Vec<Option<Box<[u64; 4], A>>> =
        keys.iter().map(|&k| Some(Box::new_in([k; 4], alloc.clone()))).collect();
    let mut sum = 0;
    for &k in keys {
        if let Some(b) = boxes[k as usize].take() {
            sum += b[3];
        }
    }
    sum
}

/// Benchmark: box every key, then release them in scattered order.
fn bench_scattered_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("scattered_release");
    let p = &PROFILES[1];
    let keys = scattered_keys(p.items, 42);
    group.bench_function("arena", |b| {
        b.iter(|| black_box(box_and_release(&arena(p), &keys)));
    });
    group.bench_function("recycle", |b| {
        b.iter(|| black_box(box_and_release(&recycling(p), &keys)));
    });
    group.bench_function("global", |b| {
        b.iter(|| black_box(box_and_release(&Global, &keys)));
    });
    group.finish();
}

criterion_group!(benches, bench_vec_push, bench_churn, bench_scattered_release);
criterion_main!(benches);
