//! # Cache Traits
//!
//! Read-only views shared by the single-threaded cache and its locked
//! wrapper. Lookups that may construct entries stay inherent: they are generic
//! over the requested variant and cannot be expressed through a trait object.
//!
//! ```text
//!   ┌───────────────────────────────┐
//!   │       ReadOnlyCache<K>        │
//!   │                               │
//!   │  contains(&, &K) → bool       │
//!   │  len(&) → usize               │
//!   │  is_empty(&) → bool           │
//!   │  capacity(&) → usize          │
//!   └───────────────┬───────────────┘
//!                   │
//!        ┌──────────┴───────────┐
//!        ▼                      ▼
//!   SegmentedCache<K, E>   SharedCache<K, E>  (+ ConcurrentCache)
//! ```
//!
//! ## Example
//!
//! ```
//! use poolcache::traits::ReadOnlyCache;
//!
//! fn fill_ratio<K>(cache: &impl ReadOnlyCache<K>) -> f64 {
//!     if cache.capacity() == 0 {
//!         return 0.0;
//!     }
//!     cache.len() as f64 / cache.capacity() as f64
//! }
//! ```

/// Inspection operations that never reorder or construct entries.
pub trait ReadOnlyCache<K> {
    /// Returns `true` if `key` is cached.
    fn contains(&self, key: &K) -> bool;

    /// Number of cached entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries the cache may hold.
    fn capacity(&self) -> usize;
}

/// Marker for cache types safe to share across threads.
///
/// ```
/// use poolcache::traits::ConcurrentCache;
///
/// fn assert_shareable<C: ConcurrentCache>(_: &C) {}
/// ```
pub trait ConcurrentCache: Send + Sync {}
