//! Arena usage counters.

/// Point-in-time counters for one arena.
///
/// `bytes_allocated` counts requested bytes served from blocks. Requests
/// served from a free list bump `alloc_count` and `recycled_count` but leave
/// `bytes_allocated` alone, so the gap between the pure and recycling
/// variants shows up directly in this number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Number of successful non-empty allocations.
    pub alloc_count: usize,
    /// Number of non-empty deallocations.
    pub dealloc_count: usize,
    /// Allocations satisfied from a free list.
    pub recycled_count: usize,
    /// Requested bytes served from blocks (excludes rounding and padding).
    pub bytes_allocated: usize,
    /// Number of blocks in the chain.
    pub block_count: usize,
    /// Sum of block capacities in bytes.
    pub reserved_bytes: usize,
    /// Sum of consumed block bytes, including rounding and padding.
    pub used_bytes: usize,
    /// Slots waiting on free lists.
    pub free_slots: usize,
}

impl ArenaStats {
    /// Allocations not yet matched by a deallocation.
    pub fn outstanding(&self) -> usize {
        self.alloc_count.saturating_sub(self.dealloc_count)
    }

    /// Fraction of allocations that have since been deallocated.
    ///
    /// On a pure arena this approximates how much reserved space is dead.
    /// When it approaches 1.0, copying the live values into a fresh arena
    /// and dropping the old one reclaims the difference.
    pub fn dead_fraction(&self) -> f64 {
        if self.alloc_count == 0 {
            return 0.0;
        }
        self.dealloc_count as f64 / self.alloc_count as f64
    }
}
