//! Pool usage counters.

/// Statistics for pool usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of successful acquisitions.
    pub acquires: u64,
    /// Number of successful releases.
    pub releases: u64,
    /// Number of acquisitions refused because the pool was empty.
    pub exhaustions: u64,
    /// Highest number of instances outstanding at once.
    pub peak_outstanding: usize,
}

impl PoolStats {
    /// Increment the acquire counter and track the outstanding peak.
    pub fn record_acquire(&mut self, outstanding: usize) {
        self.acquires += 1;
        self.peak_outstanding = self.peak_outstanding.max(outstanding);
    }

    /// Increment the release counter.
    pub fn record_release(&mut self) {
        self.releases += 1;
    }

    /// Increment the exhaustion counter.
    pub fn record_exhaustion(&mut self) {
        self.exhaustions += 1;
    }

    /// Reset all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
