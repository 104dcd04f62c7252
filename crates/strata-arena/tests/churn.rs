//! Integration test: insert/erase churn with pure and recycling arenas.
//!
//! Inserts one million keys into an arena-backed chained hash map, erasing
//! key `i - 5` on every fifth step past the warm-up. The pure arena's byte counter must never decrease; the
//! recycling arena must serve the erase/insert pairs from its free lists
//! and draw fewer fresh bytes from its blocks.

use allocator_api2::alloc::Allocator;
use strata_arena::{ArenaAlloc, ArenaStats, RecycleAlloc};
use strata_test_utils::{run_churn, ChurnReport};

const KEYS: u64 = 1_000_000;
const SAMPLE_EVERY: u64 = 10_000;

/// Run the churn and sample `bytes_allocated` every `SAMPLE_EVERY` steps.
fn sampled<A: Allocator + Clone>(alloc: &A, stats: impl Fn() -> ArenaStats) -> (ChurnReport, Vec<usize>) {
    let mut samples = Vec::new();
    let report = run_churn(alloc, KEYS, |i| {
        if i % SAMPLE_EVERY == 0 {
            samples.push(stats().bytes_allocated);
        }
    });
    (report, samples)
}

fn deltas(samples: &[usize]) -> Vec<usize> {
    samples.windows(2).map(|w| w[1] - w[0]).collect()
}

#[test]
fn pure_arena_bytes_only_grow() {
    let alloc: ArenaAlloc<u8> = ArenaAlloc::new(65_536);
    let (report, samples) = sampled(&alloc, || alloc.stats());

    assert_eq!(report.inserted, KEYS);
    assert!(samples.windows(2).all(|w| w[0] < w[1]));
    let stats = alloc.stats();
    assert_eq!(stats.recycled_count, 0);
    // The bucket array, then one node and one payload per key.
    assert_eq!(stats.alloc_count, 2 * KEYS as usize + 1);
    // The map is gone, so everything has been handed back.
    assert_eq!(stats.dealloc_count, stats.alloc_count);
}

#[test]
fn recycling_arena_reuses_erased_nodes() {
    let pure: ArenaAlloc<u8> = ArenaAlloc::new(65_536);
    let (_, pure_samples) = sampled(&pure, || pure.stats());

    let recycling: RecycleAlloc<u8> = RecycleAlloc::new(65_536);
    let (report, samples) = sampled(&recycling, || recycling.stats());

    let stats = recycling.stats();
    assert_eq!(report.live, (KEYS - report.erased) as usize);
    // Each erase frees a node and its payload; the next insert takes both back.
    assert_eq!(stats.recycled_count, 2 * report.erased as usize);
    assert!(stats.bytes_allocated * 10 <= pure.stats().bytes_allocated * 9);

    let pure_windows = deltas(&pure_samples);
    for (k, window) in deltas(&samples).into_iter().enumerate() {
        assert!(
            window * 10 <= pure_windows[k] * 9,
            "window {k}: {window} fresh bytes vs {} on the pure arena",
            pure_windows[k]
        );
    }
}
