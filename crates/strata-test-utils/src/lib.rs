//! Test utilities for Strata development.
//!
//! Provides instrumented backing sources ([`CountingSource`],
//! [`BudgetSource`]) that report through a shared [`SourceLedger`], the
//! insert/erase workload used to compare the pure and recycling arenas
//! ([`run_churn`]), and range helpers for overlap checks.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod churn;
pub mod sources;

pub use churn::{run_churn, ChurnReport, Node, NodeMap};
pub use sources::{BudgetSource, CountingSource, SourceLedger};

/// Panic if any two half-open `(start, end)` ranges overlap.
///
/// Sorts `ranges` in place.
pub fn assert_disjoint(ranges: &mut [(usize, usize)]) {
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        assert!(
            pair[0].1 <= pair[1].0,
            "ranges overlap: {:#x}..{:#x} and {:#x}..{:#x}",
            pair[0].0,
            pair[0].1,
            pair[1].0,
            pair[1].1
        );
    }
}
