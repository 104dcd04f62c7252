//! Reference-counted allocator handles.
//!
//! An [`ArenaAlloc`] is what a container holds. Every handle derived from
//! another one, by [`Clone`] or by [`ArenaAlloc::rebind`] to a different
//! element type, shares the same [`Arena`]; the arena and all its blocks are
//! released when the last of those handles is dropped.
//!
//! Handles are `!Send` and `!Sync`. The reference count and the block chain
//! are mutated without synchronisation, so one arena family belongs to one
//! thread. Values built in arena memory may still be read from elsewhere
//! through ordinary borrows, since blocks never move while the arena lives.

use std::alloc::{handle_alloc_error, Layout};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;
use std::rc::Rc;

use allocator_api2::alloc::{AllocError, Allocator};

use crate::arena::Arena;
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::raw;
use crate::reuse::{BumpOnly, FreeLists, ReusePolicy};
use crate::source::{BackingSource, HeapSource};
use crate::stats::ArenaStats;

/// Typed handle onto a shared [`Arena`].
///
/// `T` only sizes the counted [`allocate`](ArenaAlloc::allocate) and
/// [`deallocate`](ArenaAlloc::deallocate) calls; the arena itself is
/// untyped. Through [`Allocator`] a handle of any `T` can back containers of
/// any element type.
///
/// Two handles compare equal iff they share an arena, whatever their
/// element types.
pub struct ArenaAlloc<T, S: BackingSource = HeapSource, P: ReusePolicy = BumpOnly> {
    arena: Rc<RefCell<Arena<S, P>>>,
    _marker: PhantomData<fn() -> T>,
}

/// Handle onto an arena that recycles freed slots by size class.
pub type RecycleAlloc<T, S = HeapSource> = ArenaAlloc<T, S, FreeLists>;

impl<T, P: ReusePolicy> ArenaAlloc<T, HeapSource, P> {
    /// Create a handle onto a fresh heap-backed arena.
    ///
    /// `default_block_size` below [`ArenaConfig::MIN_BLOCK_SIZE`] is raised to
    /// the floor.
    ///
    /// # Panics
    ///
    /// Aborts through [`handle_alloc_error`] if the first block cannot be
    /// allocated, and panics if `default_block_size` cannot be described by
    /// a `Layout`.
    pub fn new(default_block_size: usize) -> Self {
        match Self::try_with_source(&ArenaConfig::new(default_block_size), HeapSource) {
            Ok(handle) => handle,
            Err(ArenaError::SourceExhausted { layout }) => handle_alloc_error(layout),
            Err(err) => panic!("cannot create arena: {err}"),
        }
    }
}

impl<T, P: ReusePolicy> Default for ArenaAlloc<T, HeapSource, P> {
    fn default() -> Self {
        Self::new(ArenaConfig::DEFAULT_BLOCK_SIZE)
    }
}

impl<T, S: BackingSource, P: ReusePolicy> ArenaAlloc<T, S, P> {
    /// Create a handle onto a fresh arena drawing blocks from `source`.
    ///
    /// The new arena's reference count is 1.
    pub fn try_with_source(config: &ArenaConfig, source: S) -> Result<Self, ArenaError> {
        let arena = Arena::new(config, source)?;
        Ok(Self {
            arena: Rc::new(RefCell::new(arena)),
            _marker: PhantomData,
        })
    }

    /// A handle for element type `U` sharing this handle's arena.
    pub fn rebind<U>(&self) -> ArenaAlloc<U, S, P> {
        let handle = ArenaAlloc {
            arena: Rc::clone(&self.arena),
            _marker: PhantomData,
        };
        tracing::trace!(refs = handle.ref_count(), "handle rebound");
        handle
    }

    /// Allocate uninitialised storage for `count` values of `T`.
    ///
    /// `count == 0` (or a zero-sized `T`) returns a dangling, aligned pointer.
    ///
    /// # Errors
    ///
    /// [`ArenaError::LayoutOverflow`] if `count * size_of::<T>()` does not
    /// fit a `Layout`, or the source's error if a new block is needed and
    /// cannot be obtained.
    pub fn allocate(&self, count: usize) -> Result<NonNull<T>, ArenaError> {
        let layout = Self::array_layout(count)?;
        self.arena.borrow_mut().allocate(layout).map(NonNull::cast)
    }

    /// Return storage for `count` values of `T` to the arena.
    ///
    /// A no-op on a pure arena apart from the counter. On the recycling
    /// variant the slot is reused by the next request of the same size.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`ArenaAlloc::allocate`] on a handle sharing this
    /// arena with the same `count`, must not have been deallocated already,
    /// and must not be used afterwards. Values in the range must already be
    /// destroyed.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        let Ok(layout) = Self::array_layout(count) else {
            return;
        };
        // SAFETY: forwarded caller contract.
        unsafe { self.arena.borrow_mut().deallocate(ptr.cast(), layout) }
    }

    /// Construct `value` in place at `ptr`.
    ///
    /// # Safety
    ///
    /// See [`raw::construct`].
    pub unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        // SAFETY: forwarded caller contract.
        unsafe { raw::construct(ptr, value) }
    }

    /// Drop the value at `ptr` in place without releasing its storage.
    ///
    /// # Safety
    ///
    /// See [`raw::destroy`].
    pub unsafe fn destroy(&self, ptr: NonNull<T>) {
        // SAFETY: forwarded caller contract.
        unsafe { raw::destroy(ptr) }
    }

    /// Largest `count` that [`ArenaAlloc::allocate`] can describe.
    pub fn max_size(&self) -> usize {
        match mem::size_of::<T>() {
            0 => usize::MAX,
            size => isize::MAX as usize / size,
        }
    }

    /// Number of live handles sharing this arena.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.arena)
    }

    /// Whether `other` shares this handle's arena.
    pub fn same_arena<U>(&self, other: &ArenaAlloc<U, S, P>) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena)
    }

    /// Snapshot of the shared arena's counters.
    pub fn stats(&self) -> ArenaStats {
        self.arena.borrow().stats()
    }

    /// Block size used for ordinary growth.
    pub fn default_block_size(&self) -> usize {
        self.arena.borrow().default_block_size()
    }

    /// Run `f` with read access to the shared arena.
    ///
    /// # Panics
    ///
    /// Panics if `f` allocates or deallocates through a handle of the same
    /// arena.
    pub fn inspect<R>(&self, f: impl FnOnce(&Arena<S, P>) -> R) -> R {
        f(&self.arena.borrow())
    }

    fn array_layout(count: usize) -> Result<Layout, ArenaError> {
        Layout::array::<T>(count).map_err(|_| ArenaError::LayoutOverflow {
            count,
            elem_size: mem::size_of::<T>(),
        })
    }
}

impl<T, S: BackingSource, P: ReusePolicy> Clone for ArenaAlloc<T, S, P> {
    fn clone(&self) -> Self {
        self.rebind()
    }
}

impl<T, S: BackingSource, P: ReusePolicy> Drop for ArenaAlloc<T, S, P> {
    fn drop(&mut self) {
        tracing::trace!(refs = self.ref_count() - 1, "handle released");
    }
}

impl<T, U, S: BackingSource, P: ReusePolicy> PartialEq<ArenaAlloc<U, S, P>> for ArenaAlloc<T, S, P> {
    fn eq(&self, other: &ArenaAlloc<U, S, P>) -> bool {
        self.same_arena(other)
    }
}

impl<T, S: BackingSource, P: ReusePolicy> Eq for ArenaAlloc<T, S, P> {}

impl<T, S: BackingSource, P: ReusePolicy> fmt::Debug for ArenaAlloc<T, S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaAlloc")
            .field("element", &std::any::type_name::<T>())
            .field("arena", &Rc::as_ptr(&self.arena))
            .field("refs", &self.ref_count())
            .finish()
    }
}

// SAFETY: blocks stay put until the last handle sharing the arena drops, and
// every clone of a handle shares that arena, so memory returned through one
// clone may be deallocated through any other.
unsafe impl<T, S: BackingSource, P: ReusePolicy> Allocator for ArenaAlloc<T, S, P> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = self
            .arena
            .borrow_mut()
            .allocate(layout)
            .map_err(|_| AllocError)?;
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: `Allocator` callers pass a pointer from this allocator with
        // the layout it was allocated with.
        unsafe { self.arena.borrow_mut().deallocate(ptr, layout) }
    }
}
