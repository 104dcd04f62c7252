//! Backing sources that supply whole block buffers.
//!
//! An arena holds exactly one [`BackingSource`] for its whole lifetime and
//! only ever asks it for block-sized ranges, never per element. The default
//! [`HeapSource`] draws from the global allocator.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::rc::Rc;

use crate::error::ArenaError;

/// Supplier of raw byte ranges for block buffers.
///
/// # Safety
///
/// A pointer returned by `allocate` must be valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and must not overlap
/// any other live range from the same source. It stays valid until it is
/// passed back to `deallocate`.
pub unsafe trait BackingSource {
    /// Obtain a range of at least `layout.size()` bytes.
    ///
    /// `layout.size()` is never zero.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError>;

    /// Release a range previously obtained from [`BackingSource::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this source with the same
    /// `layout`, and must not have been released already.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Backing source that draws from the global allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapSource;

// SAFETY: `std::alloc::alloc` satisfies the range contract for non-zero layouts.
unsafe impl BackingSource for HeapSource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        if layout.size() == 0 {
            return Err(ArenaError::SourceExhausted { layout });
        }
        // SAFETY: `layout` is non-zero-sized.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(ArenaError::SourceExhausted { layout })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller guarantees `ptr` came from `allocate` with `layout`.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

// SAFETY: forwards to the referenced source.
unsafe impl<S: BackingSource + ?Sized> BackingSource for &S {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract.
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

// SAFETY: forwards to the shared source.
unsafe impl<S: BackingSource + ?Sized> BackingSource for Rc<S> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract.
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_source_round_trip() {
        let layout = Layout::from_size_align(512, 8).unwrap();
        let ptr = HeapSource.allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 8, 0);
        // SAFETY: 512 bytes were just allocated at `ptr`.
        unsafe {
            ptr.as_ptr().write_bytes(0xAB, 512);
            assert_eq!(*ptr.as_ptr().add(511), 0xAB);
            HeapSource.deallocate(ptr, layout);
        }
    }

    #[test]
    fn heap_source_refuses_zero_sized_layout() {
        let layout = Layout::from_size_align(0, 8).unwrap();
        assert_eq!(
            HeapSource.allocate(layout),
            Err(ArenaError::SourceExhausted { layout })
        );
    }

    #[test]
    fn shared_source_forwards() {
        let source = Rc::new(HeapSource);
        let layout = Layout::from_size_align(256, 8).unwrap();
        let ptr = source.allocate(layout).unwrap();
        // SAFETY: `ptr` came from the same underlying source.
        unsafe { (&*source).deallocate(ptr, layout) };
    }
}
