pub use crate::alloc::{AllocatorStats, BlockId, Pool, PoolAllocator};
pub use crate::builder::CacheBuilder;
pub use crate::ds::{NodeId, RecencyList};
pub use crate::entry::{FromKey, KeyProvider, Variant};
pub use crate::error::{AllocError, CacheError, ConfigError, InvariantError};
#[cfg(feature = "metrics")]
pub use crate::metrics::exporter::PrometheusTextExporter;
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::SegmentedMetricsSnapshot;
#[cfg(feature = "metrics")]
pub use crate::metrics::traits::{MetricsExporter, MetricsReset, MetricsSnapshotProvider};
pub use crate::policy::segmented::SegmentedCache;
#[cfg(feature = "concurrency")]
pub use crate::sync::SharedCache;
pub use crate::traits::{ConcurrentCache, ReadOnlyCache};
