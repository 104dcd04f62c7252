//! Arena-specific error types.

use std::alloc::Layout;
use std::error::Error;
use std::fmt;

/// Errors that can occur while obtaining memory from an arena.
///
/// Caller contract violations (double free, use after the arena is gone,
/// reuse of a slot for a larger type) are not represented here: they are
/// not detected at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The backing source could not supply a block buffer.
    SourceExhausted {
        /// Layout of the block buffer that was requested.
        layout: Layout,
    },
    /// A block of the required size cannot be described by a `Layout`.
    BlockTooLarge {
        /// Requested block size in bytes.
        requested: usize,
    },
    /// `count` elements of `elem_size` bytes overflow the address space.
    LayoutOverflow {
        /// Number of elements requested.
        count: usize,
        /// Size of one element in bytes.
        elem_size: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceExhausted { layout } => {
                write!(
                    f,
                    "backing source exhausted: requested {} bytes aligned to {}",
                    layout.size(),
                    layout.align()
                )
            }
            Self::BlockTooLarge { requested } => {
                write!(f, "block of {requested} bytes exceeds the maximum layout size")
            }
            Self::LayoutOverflow { count, elem_size } => {
                write!(
                    f,
                    "layout overflow: {count} elements of {elem_size} bytes"
                )
            }
        }
    }
}

impl Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_sizes() {
        let layout = Layout::from_size_align(4096, 8).unwrap();
        let msg = ArenaError::SourceExhausted { layout }.to_string();
        assert!(msg.contains("4096"));

        let msg = ArenaError::LayoutOverflow {
            count: usize::MAX,
            elem_size: 16,
        }
        .to_string();
        assert!(msg.contains("16 bytes"));
    }
}
