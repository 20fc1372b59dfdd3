//! Expected-sends bookkeeping.

/// Number of record batches believed to have been durably ingested.
///
/// Incremented on each successful send, decremented when a lifecycle event
/// means a batch will never land.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpectedSends(u64);

impl ExpectedSends {
    /// Counter starting at zero.
    pub fn new() -> Self {
        Self(0)
    }

    /// Count one more batch as expected.
    pub fn record_send(&mut self) {
        self.0 += 1;
    }

    /// Stop expecting one batch. Saturates at zero.
    pub fn forfeit(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.0
    }
}
