//! Shared arena state: the block chain, growth policy and counters.
//!
//! An [`Arena`] is normally reached through an
//! [`ArenaAlloc`](crate::handle::ArenaAlloc) handle, which owns it behind a
//! reference count. It can also be used directly when a single owner is
//! enough.
//!
//! # Growth
//!
//! A request that does not fit the current block appends a new block:
//!
//! - `needed <= default / 2`: a block of `default` bytes.
//! - `needed > default / 2`: a block of `max(default, 2 * needed)` bytes.
//!
//! `needed` is the request size plus any padding its alignment may require.
//! The fresh block always fits the pending request. Space left in the
//! previous block is abandoned.

use std::alloc::Layout;
use std::ptr::{self, NonNull};

use crate::align::{checked_round_size, SizeClass, ALIGN_UNIT};
use crate::block::BlockChain;
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::reuse::{BumpOnly, ReusePolicy};
use crate::source::{BackingSource, HeapSource};
use crate::stats::ArenaStats;

/// Region allocator over a chain of blocks drawn from a [`BackingSource`].
///
/// `P` selects what happens on deallocation: [`BumpOnly`] only counts it,
/// [`FreeLists`](crate::reuse::FreeLists) makes the slot available to the
/// next request of the same size class.
///
/// Dropping the arena returns every block to the source, invalidating every
/// pointer it ever returned.
pub struct Arena<S: BackingSource = HeapSource, P: ReusePolicy = BumpOnly> {
    source: S,
    default_block_size: usize,
    chain: BlockChain,
    policy: P,
    alloc_count: usize,
    dealloc_count: usize,
    recycled_count: usize,
    bytes_allocated: usize,
}

impl<S: BackingSource, P: ReusePolicy> Arena<S, P> {
    /// Create an arena and its first block.
    ///
    /// A block size below [`ArenaConfig::MIN_BLOCK_SIZE`] is raised to the floor.
    pub fn new(config: &ArenaConfig, source: S) -> Result<Self, ArenaError> {
        let default_block_size = config.effective_block_size();
        if default_block_size != config.default_block_size {
            tracing::debug!(
                requested = config.default_block_size,
                effective = default_block_size,
                "block size raised to floor"
            );
        }
        let chain = BlockChain::new(default_block_size, &source)?;
        tracing::debug!(default_block_size, "arena created");
        Ok(Self {
            source,
            default_block_size,
            chain,
            policy: P::default(),
            alloc_count: 0,
            dealloc_count: 0,
            recycled_count: 0,
            bytes_allocated: 0,
        })
    }

    /// Allocate `layout.size()` bytes aligned to `layout.align()`.
    ///
    /// Tries the reuse policy first, then the current block, then grows the
    /// chain. Zero-sized requests get a dangling, well-aligned pointer and
    /// touch neither blocks nor counters.
    ///
    /// # Errors
    ///
    /// [`ArenaError::BlockTooLarge`] if no block large enough for the request
    /// can be described, or the source's error if it cannot supply one. The
    /// arena is left unchanged in both cases.
    pub fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        if layout.size() == 0 {
            return Ok(dangling(layout));
        }

        let class = SizeClass::of(layout.size());
        if let Some(ptr) = self.policy.take(class, layout.align()) {
            self.alloc_count += 1;
            self.recycled_count += 1;
            tracing::trace!(size = layout.size(), %class, ?ptr, "recycled slot");
            return Ok(ptr);
        }

        let ptr = match self.chain.allocate(layout.size(), layout.align()) {
            Some(ptr) => ptr,
            None => {
                let block_size = self.growth_size(layout)?;
                tracing::debug!(
                    block_size,
                    request = layout.size(),
                    blocks = self.chain.block_count() + 1,
                    "arena growing"
                );
                self.chain
                    .grow(block_size, &self.source)?
                    .allocate(layout.size(), layout.align())
                    .expect("growth block is sized to fit the pending request")
            }
        };

        self.alloc_count += 1;
        self.bytes_allocated += layout.size();
        tracing::trace!(size = layout.size(), ?ptr, "allocated");
        Ok(ptr)
    }

    /// Hand a previously allocated range back to the arena.
    ///
    /// On [`BumpOnly`] this only counts the call. On
    /// [`FreeLists`](crate::reuse::FreeLists) the slot becomes the next one
    /// served for its size class.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`Arena::allocate`] on this arena with
    /// a layout of the same size class as `layout`, must not have been
    /// deallocated since, and must not be used afterwards. Any value stored
    /// there must already have been dropped or moved out.
    pub unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        self.dealloc_count += 1;
        self.policy.give(SizeClass::of(layout.size()), ptr);
        tracing::trace!(size = layout.size(), ?ptr, "deallocated");
    }

    /// Size of the block to append for a request that did not fit.
    ///
    /// Fails with [`ArenaError::BlockTooLarge`] when twice the padded request
    /// overflows a `usize`.
    fn growth_size(&self, layout: Layout) -> Result<usize, ArenaError> {
        let too_large = || ArenaError::BlockTooLarge {
            requested: layout.size(),
        };
        let padding = layout.align().saturating_sub(ALIGN_UNIT);
        let needed = checked_round_size(layout.size())
            .and_then(|n| n.checked_add(padding))
            .ok_or_else(too_large)?;
        if needed > self.default_block_size / 2 {
            let doubled = needed.checked_mul(2).ok_or_else(too_large)?;
            Ok(self.default_block_size.max(doubled))
        } else {
            Ok(self.default_block_size)
        }
    }

    /// Block size used for ordinary growth, after applying the floor.
    pub fn default_block_size(&self) -> usize {
        self.default_block_size
    }

    /// The block chain, for inspection.
    pub fn blocks(&self) -> &BlockChain {
        &self.chain
    }

    /// The reuse policy, for inspection.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The backing source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Snapshot of the arena's counters.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            alloc_count: self.alloc_count,
            dealloc_count: self.dealloc_count,
            recycled_count: self.recycled_count,
            bytes_allocated: self.bytes_allocated,
            block_count: self.chain.block_count(),
            reserved_bytes: self.chain.reserved_bytes(),
            used_bytes: self.chain.used_bytes(),
            free_slots: self.policy.free_slots(),
        }
    }
}

impl<S: BackingSource, P: ReusePolicy> Drop for Arena<S, P> {
    fn drop(&mut self) {
        tracing::debug!(
            blocks = self.chain.block_count(),
            reserved = self.chain.reserved_bytes(),
            allocs = self.alloc_count,
            deallocs = self.dealloc_count,
            "arena destroyed"
        );
        // SAFETY: every block came from `self.source`, and the arena is gone
        // after this, so nothing can allocate from the chain again.
        unsafe { self.chain.dispose_all(&self.source) };
    }
}

/// Non-null pointer aligned to `layout.align()` that owns no memory.
fn dangling(layout: Layout) -> NonNull<u8> {
    // SAFETY: alignments are non-zero.
    unsafe { NonNull::new_unchecked(ptr::without_provenance_mut(layout.align())) }
}
