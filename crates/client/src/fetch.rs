//! Stale-response discipline for view fetches.
//!
//! Each view owns one tracker. Starting a fetch takes a ticket; only the
//! ticket of the most recently started fetch is current, and leaving the view
//! invalidates every outstanding ticket. Responses carrying a stale ticket are
//! dropped instead of overwriting newer state.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

#[derive(Debug, Default)]
pub struct FetchTracker {
    generation: AtomicU64,
}

impl FetchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch, superseding any fetch already in flight.
    pub fn begin(&self) -> FetchTicket {
        FetchTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Invalidate every outstanding ticket (the view was left).
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }
}
