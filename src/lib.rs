//! poolcache: segmented LRU caching over size-classed memory pools.
//!
//! Entries of differing concrete types share one cache. Each type is
//! constructed into the fixed-capacity pool matching its byte size, and a
//! two-segment recency policy decides which entries survive.
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`alloc`]     | `Pool`, `PoolAllocator`, `BlockId` handles            |
//! | [`entry`]     | `KeyProvider`, `Variant`, `FromKey` entry capabilities |
//! | [`policy`]    | `SegmentedCache` replacement policy                   |
//! | [`builder`]   | `CacheBuilder` configuration                          |
//! | [`ds`]        | `RecencyList` backing the segments                    |
//! | `metrics`     | Counters, snapshots, exporters (feature `metrics`)    |
//! | `sync`        | `SharedCache` (feature `concurrency`)                 |

pub mod alloc;
pub mod builder;
pub mod ds;
pub mod entry;
pub mod error;
pub mod policy;

#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "concurrency")]
pub mod sync;

pub mod prelude;
pub mod traits;
