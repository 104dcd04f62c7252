//! Instrumented backing sources.
//!
//! - [`CountingSource`]: heap-backed, records every block it hands out and
//!   takes back.
//! - [`BudgetSource`]: like `CountingSource`, but refuses any block that
//!   would push its live bytes over a fixed budget.
//!
//! Both report through a [`SourceLedger`], which the test keeps after the
//! source itself has moved into an arena.

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use strata_arena::{ArenaError, BackingSource, HeapSource};

#[derive(Debug, Default)]
struct Counts {
    allocations: Cell<usize>,
    deallocations: Cell<usize>,
    live_bytes: Cell<usize>,
    peak_bytes: Cell<usize>,
    refused: Cell<usize>,
}

/// Shared view of a test source's counters.
#[derive(Clone, Debug, Default)]
pub struct SourceLedger {
    counts: Rc<Counts>,
}

impl SourceLedger {
    /// Ranges handed out so far.
    pub fn allocations(&self) -> usize {
        self.counts.allocations.get()
    }

    /// Ranges returned so far.
    pub fn deallocations(&self) -> usize {
        self.counts.deallocations.get()
    }

    /// Ranges handed out and not yet returned.
    pub fn live_ranges(&self) -> usize {
        self.allocations() - self.deallocations()
    }

    /// Bytes handed out and not yet returned.
    pub fn live_bytes(&self) -> usize {
        self.counts.live_bytes.get()
    }

    /// Highest value `live_bytes` has reached.
    pub fn peak_bytes(&self) -> usize {
        self.counts.peak_bytes.get()
    }

    /// Requests refused by a budget.
    pub fn refused(&self) -> usize {
        self.counts.refused.get()
    }

    fn record_alloc(&self, size: usize) {
        let c = &self.counts;
        c.allocations.set(c.allocations.get() + 1);
        c.live_bytes.set(c.live_bytes.get() + size);
        c.peak_bytes.set(c.peak_bytes.get().max(c.live_bytes.get()));
    }

    fn record_dealloc(&self, size: usize) {
        let c = &self.counts;
        c.deallocations.set(c.deallocations.get() + 1);
        c.live_bytes.set(c.live_bytes.get() - size);
    }

    fn record_refusal(&self) {
        self.counts.refused.set(self.counts.refused.get() + 1);
    }
}

/// Heap-backed source that records every range.
#[derive(Debug)]
pub struct CountingSource {
    ledger: SourceLedger,
}

impl CountingSource {
    /// Create a source and the ledger that observes it.
    pub fn new() -> (Self, SourceLedger) {
        let ledger = SourceLedger::default();
        (
            Self {
                ledger: ledger.clone(),
            },
            ledger,
        )
    }
}

// SAFETY: delegates to `HeapSource`.
unsafe impl BackingSource for CountingSource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        let ptr = HeapSource.allocate(layout)?;
        self.ledger.record_alloc(layout.size());
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.ledger.record_dealloc(layout.size());
        // SAFETY: `ptr` came from `HeapSource` via `allocate`.
        unsafe { HeapSource.deallocate(ptr, layout) }
    }
}

/// Heap-backed source with a hard cap on live bytes.
#[derive(Debug)]
pub struct BudgetSource {
    budget: usize,
    ledger: SourceLedger,
}

impl BudgetSource {
    /// Create a source allowing at most `budget` live bytes.
    pub fn new(budget: usize) -> (Self, SourceLedger) {
        let ledger = SourceLedger::default();
        (
            Self {
                budget,
                ledger: ledger.clone(),
            },
            ledger,
        )
    }
}

// SAFETY: delegates to `HeapSource`.
unsafe impl BackingSource for BudgetSource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        if self.ledger.live_bytes() + layout.size() > self.budget {
            self.ledger.record_refusal();
            return Err(ArenaError::SourceExhausted { layout });
        }
        let ptr = HeapSource.allocate(layout)?;
        self.ledger.record_alloc(layout.size());
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.ledger.record_dealloc(layout.size());
        // SAFETY: `ptr` came from `HeapSource` via `allocate`.
        unsafe { HeapSource.deallocate(ptr, layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_source_tracks_live_ranges() {
        let (source, ledger) = CountingSource::new();
        let layout = Layout::from_size_align(256, 8).unwrap();
        let a = source.allocate(layout).unwrap();
        let b = source.allocate(layout).unwrap();
        assert_eq!(ledger.live_ranges(), 2);
        assert_eq!(ledger.live_bytes(), 512);
        // SAFETY: both ranges came from `source` with `layout`.
        unsafe {
            source.deallocate(a, layout);
            source.deallocate(b, layout);
        }
        assert_eq!(ledger.live_ranges(), 0);
        assert_eq!(ledger.peak_bytes(), 512);
    }

    #[test]
    fn budget_source_refuses_over_budget() {
        let (source, ledger) = BudgetSource::new(300);
        let layout = Layout::from_size_align(256, 8).unwrap();
        let a = source.allocate(layout).unwrap();
        assert!(matches!(
            source.allocate(layout),
            Err(ArenaError::SourceExhausted { .. })
        ));
        assert_eq!(ledger.refused(), 1);
        // SAFETY: `a` came from `source` with `layout`.
        unsafe { source.deallocate(a, layout) };
        assert_eq!(ledger.live_bytes(), 0);
    }
}
