use crate::metrics::traits::{CoreMetricsRecorder, SegmentedMetricsRecorder};

// ---------------------------------------------------------------------------
// SegmentedMetrics
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct SegmentedMetrics {
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
}

impl CoreMetricsRecorder for SegmentedMetrics {
    fn record_get_hit(&mut self) {
        self.get_calls += 1;
        self.get_hits += 1;
    }
    fn record_get_miss(&mut self) {
        self.get_calls += 1;
        self.get_misses += 1;
    }
    fn record_evicted_entry(&mut self) {
        self.evicted_entries += 1;
    }
    fn record_clear(&mut self) {
        self.clears += 1;
    }
}

impl SegmentedMetricsRecorder for SegmentedMetrics {
    fn record_promotion(&mut self) {
        self.promotions += 1;
    }
    fn record_demotion(&mut self) {
        self.demotions += 1;
    }
    fn record_construct(&mut self) {
        self.constructs += 1;
    }
    fn record_construct_failure(&mut self) {
        self.construct_failures += 1;
    }
    /// A mismatched lookup is still a `get` call, neither hit nor miss.
    fn record_type_mismatch(&mut self) {
        self.get_calls += 1;
        self.type_mismatches += 1;
    }
}
