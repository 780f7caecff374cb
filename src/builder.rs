//! Builder for pooled segmented caches.
//!
//! Collects segment bounds and pool layout, then provisions the
//! [`PoolAllocator`] and the [`SegmentedCache`] in one step.
//!
//! ## Example
//!
//! ```rust
//! use poolcache::builder::CacheBuilder;
//! use poolcache::entry::{FromKey, KeyProvider};
//!
//! struct Row { id: u64, cols: [u32; 4] }
//! impl KeyProvider<u64> for Row {
//!     fn key(&self) -> &u64 { &self.id }
//! }
//! impl FromKey<u64> for Row {
//!     fn from_key(id: &u64) -> Self { Row { id: *id, cols: [0; 4] } }
//! }
//!
//! let mut cache = CacheBuilder::new(100).variant::<Row>().build::<u64, Row>();
//! assert_eq!(cache.get::<Row>(&9).unwrap().cols, [0; 4]);
//! assert_eq!(cache.capacity(), 200);
//! ```

use std::hash::Hash;
use std::mem;

use crate::alloc::PoolAllocator;
use crate::error::ConfigError;
use crate::policy::segmented::SegmentedCache;

/// Builder for creating [`SegmentedCache`] instances.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    max_top_size: usize,
    max_low_size: usize,
    pool_budget: Option<usize>,
    size_classes: Vec<usize>,
}

impl CacheBuilder {
    /// Create a builder whose protected and probationary segments both hold
    /// `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            max_top_size: capacity,
            max_low_size: capacity,
            pool_budget: None,
            size_classes: Vec::new(),
        }
    }

    /// Set both segment bounds to `capacity`.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.max_top_size = capacity;
        self.max_low_size = capacity;
        self
    }

    /// Set the protected (`top`) and probationary (`low`) bounds separately.
    pub fn segment_capacities(mut self, top: usize, low: usize) -> Self {
        self.max_top_size = top;
        self.max_low_size = low;
        self
    }

    /// Byte budget handed to every size class (`total_count` of the allocator).
    ///
    /// Defaults to enough blocks for the whole cache in the largest class:
    /// `(top + low) * max(size_classes)`.
    pub fn pool_budget(mut self, bytes: usize) -> Self {
        self.pool_budget = Some(bytes);
        self
    }

    /// Register one size class in bytes.
    pub fn size_class(mut self, size: usize) -> Self {
        self.size_classes.push(size);
        self
    }

    /// Register several size classes in bytes.
    pub fn size_classes(mut self, sizes: impl IntoIterator<Item = usize>) -> Self {
        self.size_classes.extend(sizes);
        self
    }

    /// Register the size class of variant `T`.
    pub fn variant<T>(self) -> Self {
        self.size_class(mem::size_of::<T>())
    }

    /// Build the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the probationary capacity is zero, no size
    /// class was registered, or a size class is zero bytes.
    pub fn try_build<K, E>(self) -> Result<SegmentedCache<K, E>, ConfigError>
    where
        K: Clone + Eq + Hash,
    {
        if self.max_low_size == 0 {
            return Err(ConfigError::new(
                "probationary capacity must be greater than zero",
            ));
        }

        let largest = self.size_classes.iter().copied().max().unwrap_or(0);
        let budget = self.pool_budget.unwrap_or_else(|| {
            self.max_top_size
                .saturating_add(self.max_low_size)
                .saturating_mul(largest)
        });
        let alloc = PoolAllocator::try_new(budget, self.size_classes)?;

        tracing::debug!(
            max_top_size = self.max_top_size,
            max_low_size = self.max_low_size,
            pool_budget = budget,
            "segmented cache built"
        );
        Ok(SegmentedCache::with_segments(
            self.max_top_size,
            self.max_low_size,
            alloc,
        ))
    }

    /// Build the cache.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. See [`try_build`](Self::try_build).
    pub fn build<K, E>(self) -> SegmentedCache<K, E>
    where
        K: Clone + Eq + Hash,
    {
        match self.try_build() {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }
}
