//! Contiguous block buffers and the chain that owns them.
//!
//! A [`Block`] is one buffer drawn from a [`BackingSource`] with a bump
//! cursor. A [`BlockChain`] is the ordered list of blocks an arena has
//! created; only the last one accepts new allocations.

use std::alloc::Layout;
use std::ptr::NonNull;

use smallvec::SmallVec;

use crate::align::{align_up, checked_round_size, ALIGN_UNIT};
use crate::error::ArenaError;
use crate::source::BackingSource;

/// A single contiguous buffer with bump allocation.
///
/// The buffer address is fixed at construction and never changes, so every
/// pointer handed out stays valid until the block is disposed. Blocks do not
/// release their buffer on drop: the owning arena returns it to the source
/// through [`BlockChain::dispose_all`].
#[derive(Debug)]
pub struct Block {
    /// Start of the buffer. Aligned to [`ALIGN_UNIT`].
    buffer: NonNull<u8>,
    /// Layout the buffer was obtained with; its size is the capacity.
    layout: Layout,
    /// Bump pointer: offset of the next free byte.
    cursor: usize,
}

impl Block {
    /// Obtain a block of at least `requested` bytes from `source`.
    ///
    /// The capacity is `requested` rounded up to [`ALIGN_UNIT`], and never
    /// zero. Fails with [`ArenaError::BlockTooLarge`] before touching the
    /// source if that capacity cannot be described by a `Layout`.
    pub fn new<S: BackingSource + ?Sized>(requested: usize, source: &S) -> Result<Self, ArenaError> {
        let layout = checked_round_size(requested.max(1))
            .and_then(|capacity| Layout::from_size_align(capacity, ALIGN_UNIT).ok())
            .ok_or(ArenaError::BlockTooLarge { requested })?;
        let buffer = source.allocate(layout)?;
        Ok(Self {
            buffer,
            layout,
            cursor: 0,
        })
    }

    /// Bump-allocate `size` bytes aligned to `align`.
    ///
    /// `size` is rounded up to [`ALIGN_UNIT`]. Alignments above the unit pad
    /// the cursor first. Returns `None` without consuming anything if the
    /// rounded request does not fit in the remaining capacity.
    pub fn allocate(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let start = if align <= ALIGN_UNIT {
            self.cursor
        } else {
            let base = self.buffer.as_ptr() as usize;
            align_up(base + self.cursor, align)? - base
        };
        let end = start.checked_add(checked_round_size(size)?)?;
        if end > self.capacity() {
            return None;
        }
        self.cursor = end;
        // SAFETY: `start <= end <= capacity`, so the offset is inside the buffer.
        Some(unsafe { self.buffer.add(start) })
    }

    /// Whether `ptr` points into this block's buffer.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        let base = self.buffer.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= base && addr < base + self.capacity()
    }

    /// Start address of the buffer.
    pub fn base(&self) -> NonNull<u8> {
        self.buffer
    }

    /// Number of bytes consumed so far, including padding.
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Remaining free capacity in bytes.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }

    /// Return the buffer to `source`.
    ///
    /// # Safety
    ///
    /// `source` must be the source this block was created from, and no
    /// pointer into the block may be used afterwards.
    pub(crate) unsafe fn dispose<S: BackingSource + ?Sized>(self, source: &S) {
        // SAFETY: the buffer came from `source` with `self.layout`.
        unsafe { source.deallocate(self.buffer, self.layout) }
    }
}

/// Ordered list of [`Block`]s with the last one receiving allocations.
///
/// Growth appends a block and makes it current. Blocks are never removed
/// or reordered until the whole chain is disposed, and earlier blocks are
/// not revisited: whatever space they have left is given up.
#[derive(Debug)]
pub struct BlockChain {
    blocks: SmallVec<[Block; 4]>,
}

impl BlockChain {
    /// Create a chain holding one block of `first_block_size` bytes.
    pub fn new<S: BackingSource + ?Sized>(
        first_block_size: usize,
        source: &S,
    ) -> Result<Self, ArenaError> {
        let mut blocks = SmallVec::new();
        blocks.push(Block::new(first_block_size, source)?);
        Ok(Self { blocks })
    }

    /// Allocate from the current block only. Never grows.
    pub fn allocate(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        self.current_mut().allocate(size, align)
    }

    /// Append a block of `block_size` bytes and make it current.
    pub fn grow<S: BackingSource + ?Sized>(
        &mut self,
        block_size: usize,
        source: &S,
    ) -> Result<&mut Block, ArenaError> {
        let block = Block::new(block_size, source)?;
        self.blocks.push(block);
        Ok(self.current_mut())
    }

    /// The block currently receiving allocations.
    pub fn current(&self) -> &Block {
        // A chain is created with one block and only ever grows.
        &self.blocks[self.blocks.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Block {
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    /// Iterate over the blocks in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Whether `ptr` points into any block of the chain.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.blocks.iter().any(|b| b.contains(ptr))
    }

    /// Number of blocks in the chain.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Sum of block capacities in bytes.
    pub fn reserved_bytes(&self) -> usize {
        self.blocks.iter().map(Block::capacity).sum()
    }

    /// Sum of consumed bytes across all blocks.
    pub fn used_bytes(&self) -> usize {
        self.blocks.iter().map(Block::used).sum()
    }

    /// Return every block to `source`, leaving the chain empty.
    ///
    /// # Safety
    ///
    /// `source` must be the source the blocks were created from, and no
    /// pointer into any block may be used afterwards. The chain must not be
    /// allocated from again.
    pub(crate) unsafe fn dispose_all<S: BackingSource + ?Sized>(&mut self, source: &S) {
        for block in self.blocks.drain(..) {
            // SAFETY: forwarded caller contract.
            unsafe { block.dispose(source) };
        }
    }
}
