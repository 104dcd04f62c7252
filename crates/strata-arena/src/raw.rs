//! Placement construction and destruction at raw arena addresses.
//!
//! These two functions are the only place in the crate where untyped arena
//! bytes are treated as a `T`. The arena never tracks which slots hold live
//! values; pairing `construct` with `destroy` is the caller's job.

use std::ptr::{self, NonNull};

/// Move `value` into the slot at `ptr` without reading the old contents.
///
/// # Safety
///
/// `ptr` must be valid for writes of one `T` and aligned for `T`. Whatever
/// the slot held before is overwritten without being dropped.
#[inline]
pub unsafe fn construct<T>(ptr: NonNull<T>, value: T) {
    // SAFETY: caller guarantees `ptr` is writable and aligned for `T`.
    unsafe { ptr.as_ptr().write(value) }
}

/// Run the destructor of the `T` at `ptr`, leaving the bytes uninitialised.
///
/// # Safety
///
/// `ptr` must point to an initialised, aligned `T` that is not used again
/// until a new value is constructed there.
#[inline]
pub unsafe fn destroy<T>(ptr: NonNull<T>) {
    // SAFETY: caller guarantees `ptr` holds a live `T`.
    unsafe { ptr::drop_in_place(ptr.as_ptr()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::mem::MaybeUninit;

    struct DropCounter<'a>(&'a Cell<u32>);

    impl Drop for DropCounter<'_> {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn construct_then_destroy_runs_drop_once() {
        let drops = Cell::new(0);
        let mut slot = MaybeUninit::<DropCounter<'_>>::uninit();
        let ptr = NonNull::new(slot.as_mut_ptr()).unwrap();
        // SAFETY: `slot` is a valid, aligned, uninitialised `DropCounter`.
        unsafe {
            construct(ptr, DropCounter(&drops));
            assert_eq!(drops.get(), 0);
            destroy(ptr);
        }
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn construct_writes_value() {
        let mut slot = MaybeUninit::<(u32, f64)>::uninit();
        let ptr = NonNull::new(slot.as_mut_ptr()).unwrap();
        // SAFETY: `slot` is valid and aligned for the tuple.
        let value = unsafe {
            construct(ptr, (7, 2.5));
            slot.assume_init()
        };
        assert_eq!(value, (7, 2.5));
    }
}
