//! What an arena does with deallocated slots.
//!
//! [`BumpOnly`] drops them on the floor: bytes come back only when the whole
//! arena is destroyed. [`FreeLists`] keeps a LIFO stack of freed addresses per
//! [`SizeClass`] and hands the most recently freed one to the next request of
//! the same class.
//!
//! Free lists are partitioned strictly by rounded byte size, never by the
//! element type that was stored there. A recycled slot will receive a value
//! of whatever type the next caller constructs into it, which is sound only
//! because that caller asked for the same number of block bytes. Pushing an
//! address twice (a double free) puts it on the list twice and is not
//! detected.

use std::ptr::NonNull;

use indexmap::IndexMap;

use crate::align::SizeClass;

mod sealed {
    pub trait Sealed {}
}

/// Policy for deallocated slots. Implemented by [`BumpOnly`] and [`FreeLists`].
pub trait ReusePolicy: Default + sealed::Sealed {
    /// Take a previously freed slot of `class` whose address satisfies `align`.
    fn take(&mut self, class: SizeClass, align: usize) -> Option<NonNull<u8>>;

    /// Record that the slot at `ptr` of `class` is free again.
    fn give(&mut self, class: SizeClass, ptr: NonNull<u8>);

    /// Number of slots currently waiting for reuse.
    fn free_slots(&self) -> usize;

    /// Total bytes held in slots waiting for reuse.
    fn free_bytes(&self) -> usize;
}

/// Pure arena: deallocation never makes bytes available again.
#[derive(Clone, Copy, Debug, Default)]
pub struct BumpOnly;

impl sealed::Sealed for BumpOnly {}

impl ReusePolicy for BumpOnly {
    #[inline]
    fn take(&mut self, _class: SizeClass, _align: usize) -> Option<NonNull<u8>> {
        None
    }

    #[inline]
    fn give(&mut self, _class: SizeClass, _ptr: NonNull<u8>) {}

    fn free_slots(&self) -> usize {
        0
    }

    fn free_bytes(&self) -> usize {
        0
    }
}

/// Recycling variant: one LIFO stack of freed addresses per size class.
///
/// Reuse is exact-class only. A freed 64-byte slot never serves a 56- or
/// 72-byte request, and adjacent free slots are never merged.
#[derive(Debug, Default)]
pub struct FreeLists {
    lists: IndexMap<SizeClass, Vec<NonNull<u8>>>,
}

impl FreeLists {
    /// Number of free slots waiting in `class`.
    pub fn len_of(&self, class: SizeClass) -> usize {
        self.lists.get(&class).map_or(0, Vec::len)
    }

    /// Size classes that have been freed into at least once, in first-use order.
    pub fn classes(&self) -> impl Iterator<Item = SizeClass> + '_ {
        self.lists.keys().copied()
    }
}

impl sealed::Sealed for FreeLists {}

impl ReusePolicy for FreeLists {
    fn take(&mut self, class: SizeClass, align: usize) -> Option<NonNull<u8>> {
        let list = self.lists.get_mut(&class)?;
        let top = *list.last()?;
        // Only the top of the stack is considered; a misaligned top sends the
        // request to the bump path instead of reordering the list.
        if top.as_ptr() as usize % align != 0 {
            return None;
        }
        list.pop()
    }

    fn give(&mut self, class: SizeClass, ptr: NonNull<u8>) {
        self.lists.entry(class).or_default().push(ptr);
    }

    fn free_slots(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    fn free_bytes(&self) -> usize {
        self.lists
            .iter()
            .map(|(class, list)| class.bytes() * list.len())
            .sum()
    }
}
