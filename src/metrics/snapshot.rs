#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SegmentedMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,

    pub evicted_entries: u64,
    pub clears: u64,

    pub promotions: u64,
    pub demotions: u64,
    pub constructs: u64,
    pub construct_failures: u64,
    pub type_mismatches: u64,

    // allocator counters at snapshot time
    pub pool_allocations: u64,
    pub pool_releases: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub protected_len: usize,
    pub probationary_len: usize,
    pub capacity: usize,
}

impl SegmentedMetricsSnapshot {
    /// Fraction of `get` calls that were hits; `0.0` before the first call.
    ///
    /// Type-mismatched lookups count as calls, so they lower the ratio.
    pub fn hit_ratio(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }
}
