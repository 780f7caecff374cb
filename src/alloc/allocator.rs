//! Size-classed pool allocator.
//!
//! [`PoolAllocator`] owns one [`Pool`] per registered byte size. A construct
//! request for a concrete variant `T` is routed to the pool whose size class
//! equals `size_of::<T>()`; requests for any other size fail fast with
//! [`AllocError::UnsupportedSizeClass`].
//!
//! ## Architecture
//!
//! ```text
//!   PoolAllocator::new(total_count = 64, [16, 32])
//!
//!   pools: BTreeMap<usize, Pool<E>>
//!   ┌────────────┬──────────────────────────────┐
//!   │ 16 bytes   │ Pool { 64 / 16 = 4 blocks }  │
//!   │ 32 bytes   │ Pool { 64 / 32 = 2 blocks }  │
//!   └────────────┴──────────────────────────────┘
//!
//!   construct::<T>(v) ─► pools[size_of::<T>()].allocate(v.wrap())
//!   destroy(id)       ─► first pool where contains(id) ─► release(id) ─► drop E
//! ```
//!
//! Destroying drops the stored entry as the entry type it was constructed
//! into, so teardown always matches construction.
//!
//! The size class only selects the pool and sets its block count
//! (`total_count / size`). Every block stores a whole `Option<E>`, so the
//! memory a pool really reserves is `block_count * size_of::<Option<E>>()`,
//! whatever its size class.
//!
//! ## Example
//!
//! ```
//! use poolcache::alloc::PoolAllocator;
//! use poolcache::error::AllocError;
//!
//! let mut alloc: PoolAllocator<u64> = PoolAllocator::new(16, [8]);
//! let id = alloc.construct(42u64).unwrap();
//! assert_eq!(alloc.get(id), Some(&42));
//!
//! assert!(alloc.destroy(id));
//! assert!(!alloc.destroy(id)); // already released: silently ignored
//! assert_eq!(alloc.stats().allocations, 1);
//! ```

use std::collections::BTreeMap;
use std::mem;

use crate::alloc::pool::{BlockId, Pool};
use crate::entry::Variant;
use crate::error::{AllocError, ConfigError};

/// Allocation counters kept by a [`PoolAllocator`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Successful `construct` calls.
    pub allocations: u64,
    /// Successful `destroy` calls.
    pub releases: u64,
    /// `construct` calls that failed with either error kind.
    pub failures: u64,
}

impl AllocatorStats {
    /// Number of blocks currently in use according to the counters.
    pub fn live(&self) -> u64 {
        self.allocations - self.releases
    }
}

/// Registry of fixed-capacity pools keyed by block byte size.
#[derive(Debug)]
pub struct PoolAllocator<E> {
    pools: BTreeMap<usize, Pool<E>>,
    stats: AllocatorStats,
}

impl<E> PoolAllocator<E> {
    /// Creates an allocator with one pool per size class.
    ///
    /// Each size class receives `total_count / size` blocks.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. See [`try_new`](Self::try_new).
    pub fn new(total_count: usize, size_classes: impl IntoIterator<Item = usize>) -> Self {
        match Self::try_new(total_count, size_classes) {
            Ok(alloc) => alloc,
            Err(e) => panic!("{}", e),
        }
    }

    /// Fallible constructor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if no size class is given or a size class is
    /// zero bytes. Duplicate sizes collapse into one pool.
    pub fn try_new(
        total_count: usize,
        size_classes: impl IntoIterator<Item = usize>,
    ) -> Result<Self, ConfigError> {
        let mut pools = BTreeMap::new();
        for size in size_classes {
            if size == 0 {
                return Err(ConfigError::new("size class must be greater than zero bytes"));
            }
            let block_count = total_count / size;
            if block_count == 0 {
                tracing::warn!(
                    size_class = size,
                    total_count,
                    "size class receives no blocks; every construct will fail"
                );
            }
            pools
                .entry(size)
                .or_insert_with(|| Pool::new(size, block_count));
        }
        if pools.is_empty() {
            return Err(ConfigError::new("at least one size class is required"));
        }

        tracing::debug!(
            size_classes = ?pools.keys().collect::<Vec<_>>(),
            total_count,
            "pool allocator provisioned"
        );
        Ok(Self {
            pools,
            stats: AllocatorStats::default(),
        })
    }

    /// Returns `true` if `size` bytes is a provisioned size class.
    #[inline]
    pub fn supports_size(&self, size: usize) -> bool {
        self.pools.contains_key(&size)
    }

    /// Returns `true` if values of type `T` can be constructed here.
    #[inline]
    pub fn supports<T>(&self) -> bool {
        self.supports_size(mem::size_of::<T>())
    }

    /// Stores `value` in the pool matching `size_of::<T>()`.
    ///
    /// # Errors
    ///
    /// - [`AllocError::UnsupportedSizeClass`] if that size was never registered.
    /// - [`AllocError::OutOfCapacity`] if the matching pool is full.
    pub fn construct<T>(&mut self, value: T) -> Result<BlockId, AllocError>
    where
        T: Variant<E>,
    {
        let size = mem::size_of::<T>();
        let result = match self.pools.get_mut(&size) {
            Some(pool) => pool.allocate(value.wrap()),
            None => Err(AllocError::UnsupportedSizeClass { size }),
        };

        match result {
            Ok(id) => {
                self.stats.allocations += 1;
                Ok(id)
            },
            Err(err) => {
                self.stats.failures += 1;
                tracing::warn!(error = %err, variant = std::any::type_name::<T>(), "construct failed");
                Err(err)
            },
        }
    }

    /// Builds a `T` from `key` with `ctor` and stores it. See [`construct`](Self::construct).
    ///
    /// The size class is checked before `ctor` runs.
    pub fn construct_with<K, T>(
        &mut self,
        key: &K,
        ctor: impl FnOnce(&K) -> T,
    ) -> Result<BlockId, AllocError>
    where
        T: Variant<E>,
    {
        if !self.supports::<T>() {
            self.stats.failures += 1;
            return Err(AllocError::UnsupportedSizeClass {
                size: mem::size_of::<T>(),
            });
        }
        self.construct(ctor(key))
    }

    /// Drops the entry stored at `id` and frees its block.
    ///
    /// The owning pool is found by membership test. Returns `false` and does
    /// nothing when no pool holds a live block for `id`.
    pub fn destroy(&mut self, id: BlockId) -> bool {
        match self.take(id) {
            Some(entry) => {
                drop(entry);
                true
            },
            None => false,
        }
    }

    /// Frees the block at `id` and hands the stored entry back to the caller.
    pub fn take(&mut self, id: BlockId) -> Option<E> {
        let pool = self.pools.values_mut().find(|pool| pool.contains(id))?;
        let entry = pool.release(id)?;
        self.stats.releases += 1;
        Some(entry)
    }

    pub fn get(&self, id: BlockId) -> Option<&E> {
        self.pools.get(&id.size_class())?.get(id)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut E> {
        self.pools.get_mut(&id.size_class())?.get_mut(id)
    }

    /// Returns `true` if `id` names a live block of this allocator.
    pub fn is_allocated(&self, id: BlockId) -> bool {
        self.get(id).is_some()
    }

    /// Provisioned size classes in ascending order.
    pub fn size_classes(&self) -> impl Iterator<Item = usize> + '_ {
        self.pools.keys().copied()
    }

    /// The pool serving `size` bytes, if provisioned.
    pub fn pool(&self, size: usize) -> Option<&Pool<E>> {
        self.pools.get(&size)
    }

    /// Blocks in use across all pools.
    pub fn len(&self) -> usize {
        self.pools.values().map(Pool::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.values().all(Pool::is_empty)
    }

    /// Blocks reserved across all pools.
    pub fn capacity(&self) -> usize {
        self.pools.values().map(Pool::capacity).sum()
    }

    /// Snapshot of the allocation counters.
    pub fn stats(&self) -> AllocatorStats {
        self.stats
    }
}
