//! Reference-counted region allocation for standard containers.
//!
//! Replaces many small allocations with a few large blocks that are
//! released together. Containers hold a cheap [`ArenaAlloc`] handle; all
//! handles derived from one another share a single [`Arena`], which lives
//! until the last of them is dropped.
//!
//! # Architecture
//!
//! ```text
//! ArenaAlloc<T> ×N (Rc-shared, rebindable to any element type)
//! └── Arena<S, P>
//!     ├── S: BackingSource (HeapSource by default), supplies whole blocks
//!     ├── BlockChain → Block[] (bump cursor, fixed buffer address)
//!     └── P: ReusePolicy
//!         ├── BumpOnly   (deallocate only counts)
//!         └── FreeLists  (LIFO stack per SizeClass)
//! ```
//!
//! # Variants
//!
//! - **[`ArenaAlloc`]:** pure arena. Freed bytes come back only when the
//!   arena is destroyed.
//! - **[`RecycleAlloc`]:** freed slots are handed to the next request with
//!   the same rounded size, whatever type it will hold.
//!
//! # Threading
//!
//! Handles are `!Send + !Sync`: one arena family per thread. Memory that
//! holds finished values may be read from other threads through borrows as
//! long as the owning arena is alive.
//!
//! # Example
//!
//! ```
//! use allocator_api2::vec::Vec;
//! use strata_arena::ArenaAlloc;
//!
//! let alloc: ArenaAlloc<u8> = ArenaAlloc::new(4096);
//! let mut v = Vec::new_in(alloc.clone());
//! v.extend_from_slice(&[1u32, 2, 3]);
//! assert_eq!(v.iter().sum::<u32>(), 6);
//! assert_eq!(alloc.ref_count(), 2);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod align;
pub mod arena;
pub mod block;
pub mod config;
pub mod error;
pub mod handle;
pub mod raw;
pub mod reuse;
pub mod source;
pub mod stats;

// Public re-exports for the primary API surface.
pub use align::{SizeClass, ALIGN_UNIT};
pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use handle::{ArenaAlloc, RecycleAlloc};
pub use reuse::{BumpOnly, FreeLists, ReusePolicy};
pub use source::{BackingSource, HeapSource};
pub use stats::ArenaStats;
