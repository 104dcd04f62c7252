//! Allocation granularity and size classes.
//!
//! Every request is rounded up to a multiple of [`ALIGN_UNIT`] before it is
//! carved from a block. The rounded size doubles as the free-list key of the
//! recycling variant, so two requests share a [`SizeClass`] exactly when
//! they consume the same number of block bytes.

use std::fmt;
use std::mem;

#[allow(dead_code)]
#[repr(C)]
union RoundUnit {
    d: f64,
    p: *const u8,
}

/// Granularity of every block allocation, in bytes.
///
/// The size of the wider of an `f64` and a pointer, so any address that
/// is a multiple of it can hold either.
pub const ALIGN_UNIT: usize = mem::size_of::<RoundUnit>();

/// Round `bytes` up to the next multiple of [`ALIGN_UNIT`].
///
/// Overflows if `bytes` is within `ALIGN_UNIT` of `usize::MAX`. Any size
/// accepted by `Layout` (at most `isize::MAX`) rounds safely; sizes derived
/// by arithmetic on top of that go through [`checked_round_size`].
#[inline]
pub const fn round_size(bytes: usize) -> usize {
    bytes.div_ceil(ALIGN_UNIT) * ALIGN_UNIT
}

/// Like [`round_size`], but `None` where the result does not fit a `usize`.
#[inline]
pub const fn checked_round_size(bytes: usize) -> Option<usize> {
    bytes.checked_next_multiple_of(ALIGN_UNIT)
}

/// Round `addr` up to a multiple of `align` (a power of two), or `None` on
/// overflow.
#[inline]
pub(crate) const fn align_up(addr: usize, align: usize) -> Option<usize> {
    match addr.checked_add(align - 1) {
        Some(bumped) => Some(bumped & !(align - 1)),
        None => None,
    }
}

/// A request size rounded up to the allocation granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SizeClass(usize);

impl SizeClass {
    /// Size class of a request for `bytes` bytes.
    #[inline]
    pub const fn of(bytes: usize) -> Self {
        Self(round_size(bytes))
    }

    /// Number of block bytes a request in this class consumes.
    #[inline]
    pub const fn bytes(self) -> usize {
        self.0
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}B", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_covers_pointer_and_double() {
        assert!(ALIGN_UNIT >= mem::size_of::<f64>());
        assert!(ALIGN_UNIT >= mem::size_of::<*const u8>());
        assert!(ALIGN_UNIT.is_power_of_two());
    }

    #[test]
    fn round_size_is_multiple_of_unit() {
        assert_eq!(round_size(0), 0);
        assert_eq!(round_size(1), ALIGN_UNIT);
        assert_eq!(round_size(ALIGN_UNIT), ALIGN_UNIT);
        assert_eq!(round_size(ALIGN_UNIT + 1), 2 * ALIGN_UNIT);
    }

    #[test]
    fn checked_round_size_rejects_top_of_range() {
        assert_eq!(checked_round_size(1), Some(ALIGN_UNIT));
        assert_eq!(
            checked_round_size(isize::MAX as usize),
            Some(round_size(isize::MAX as usize))
        );
        assert_eq!(checked_round_size(usize::MAX), None);
        assert_eq!(checked_round_size(usize::MAX - ALIGN_UNIT + 2), None);
    }

    #[test]
    fn size_class_groups_by_rounded_bytes() {
        assert_eq!(SizeClass::of(1), SizeClass::of(ALIGN_UNIT));
        assert_ne!(SizeClass::of(64), SizeClass::of(128));
        assert_eq!(SizeClass::of(60).bytes(), 64);
    }

    #[test]
    fn align_up_rounds_to_power_of_two() {
        assert_eq!(align_up(0, 16), Some(0));
        assert_eq!(align_up(1, 16), Some(16));
        assert_eq!(align_up(24, 16), Some(32));
        assert_eq!(align_up(32, 16), Some(32));
        assert_eq!(align_up(usize::MAX - 3, 16), None);
    }
}
