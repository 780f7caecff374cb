//! # Metrics Trait Hierarchy
//!
//! Recording, snapshotting, and export are split into small traits so the
//! cache only ever writes counters, tests and benches read snapshots, and
//! monitoring code publishes them.
//!
//! ```text
//!              ┌─────────────────────────────┐
//!              │     CoreMetricsRecorder     │
//!              │  get_hit/get_miss/evict     │
//!              │  clear                      │
//!              └──────────────┬──────────────┘
//!                             │
//!                             ▼
//!              ┌─────────────────────────────┐
//!              │  SegmentedMetricsRecorder   │
//!              │  promotion/demotion         │
//!              │  construct/construct_failure│
//!              │  type_mismatch              │
//!              └─────────────────────────────┘
//!
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Common counters for any cache.
pub trait CoreMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_clear(&mut self);
}

/// Metrics for the segmented (protected/probationary) cache.
pub trait SegmentedMetricsRecorder: CoreMetricsRecorder {
    /// A probationary hit moved its entry into the protected segment.
    fn record_promotion(&mut self);
    /// A protected entry was pushed back into the probationary segment.
    fn record_demotion(&mut self);
    /// A miss constructed a new pooled entry.
    fn record_construct(&mut self);
    /// A miss failed to construct because the allocator refused.
    fn record_construct_failure(&mut self);
    /// A hit held a different variant than the caller requested.
    fn record_type_mismatch(&mut self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset metrics between tests or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&mut self);
}

/// Export/publish metrics to production monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
