use serde::{Deserialize, Serialize};

/// A counter object used to allocate commit sequence numbers.
///
/// The value a transaction observes via [`Counter::peek`] only becomes its
/// committed position once the transaction succeeds and [`Counter::advance`]
/// runs; aborted transactions never consume a number, so the sequence has no
/// gaps and commit order is exactly allocation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    next: u64,
}

impl Counter {
    /// Create a new `Counter` starting at the given value.
    pub fn new(start: u64) -> Self {
        Self { next: start }
    }

    /// The value the next committed transaction will receive.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Allocate the next value, returning it.
    pub fn advance(&mut self) -> u64 {
        let value = self.next;
        self.next += 1;
        value
    }
}
