//! Benchmark profiles and utilities for the Strata allocators.
//!
//! - [`PROFILES`]: block-size / workload pairs shared by every bench
//! - [`scattered_keys`]: deterministic key order for lookup-heavy runs

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strata_arena::ArenaConfig;

/// One benchmark configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Profile {
    /// Label used in benchmark ids.
    pub name: &'static str,
    /// Arena default block size.
    pub block_size: usize,
    /// Elements or keys per iteration.
    pub items: u64,
}

impl Profile {
    /// Arena configuration for this profile.
    pub fn config(&self) -> ArenaConfig {
        ArenaConfig::new(self.block_size)
    }
}

/// Small blocks with frequent growth, and the default block size.
pub const PROFILES: [Profile; 2] = [
    Profile {
        name: "small_blocks",
        block_size: 1024,
        items: 10_000,
    },
    Profile {
        name: "default_blocks",
        block_size: ArenaConfig::DEFAULT_BLOCK_SIZE,
        items: 10_000,
    },
];

/// `n` distinct keys in `0..n`, in a seed-dependent order.
pub fn scattered_keys(n: u64, seed: u64) -> Vec<u64> {
    let mut keys: Vec<u64> = (0..n).collect();
    let mut state = seed;
    for i in (1..keys.len()).rev() {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let j = (state >> 33) as usize % (i + 1);
        keys.swap(i, j);
    }
    keys
}
