//! Segmented LRU cache over pooled, polymorphic entries.
//!
//! Entries are kept in two recency-ordered segments. A key seen for the first
//! time enters the probationary segment; only a second hit promotes it into the
//! protected segment. One-off lookups and scans therefore churn the
//! probationary segment without disturbing entries that have proven reuse.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        SegmentedCache<K, E> Layout                          │
//! │                                                                             │
//! │   index: FxHashMap<K, Slot>              alloc: PoolAllocator<E>            │
//! │   ┌──────────┬──────────────────┐        ┌──────────┬──────────────────┐    │
//! │   │ "page1"  │ Probationary, n0 │        │ 16 bytes │ Pool { blocks }  │    │
//! │   │ "page2"  │ Protected,    n3 │        │ 32 bytes │ Pool { blocks }  │    │
//! │   └──────────┴──────────────────┘        └──────────┴──────────────────┘    │
//! │                                                    ▲                        │
//! │   PROTECTED (top, max_top_size)                    │ BlockId                │
//! │   MRU [b3] ◄──► [b1] ◄──► [b7] LRU ───demote──┐    │                        │
//! │                                               ▼    │                        │
//! │   PROBATIONARY (low, max_low_size)                 │                        │
//! │   MRU [b7] ◄──► [b0] ◄──► [b4] LRU ───evict──► destroy(b4)                  │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lookup Flow
//!
//! ```text
//!   get::<T>(key):
//!     1. Protected hit     → move to protected MRU
//!     2. Probationary hit  → if protected is full, demote its LRU to
//!                            probationary MRU (entry survives);
//!                            move the hit to protected MRU
//!     3. Miss              → if probationary is full, destroy its LRU
//!                            through the allocator (only path that frees);
//!                            construct T::from_key(key) in the pool for
//!                            size_of::<T>(), link at probationary MRU
//! ```
//!
//! A hit whose stored variant is not `T` fails with
//! [`CacheError::TypeMismatch`] and leaves both segments untouched.
//!
//! ## Operations
//!
//! | Operation   | Time   | Notes                                         |
//! |-------------|--------|-----------------------------------------------|
//! | `get`       | O(1)*  | *Plus one pool allocation on a miss           |
//! | `peek`      | O(1)   | No reordering                                 |
//! | `contains`  | O(1)   | Index lookup only                             |
//! | `len`       | O(1)   | Protected + probationary                      |
//! | `clear`     | O(n)   | Destroys every entry through the allocator    |
//!
//! ## Example Usage
//!
//! ```
//! use poolcache::alloc::PoolAllocator;
//! use poolcache::entry::{FromKey, KeyProvider};
//! use poolcache::policy::segmented::SegmentedCache;
//!
//! struct Page { key: u64, views: u32 }
//!
//! impl KeyProvider<u64> for Page {
//!     fn key(&self) -> &u64 { &self.key }
//! }
//! impl FromKey<u64> for Page {
//!     fn from_key(key: &u64) -> Self { Page { key: *key, views: 0 } }
//! }
//!
//! let size = std::mem::size_of::<Page>();
//! let mut cache: SegmentedCache<u64, Page> =
//!     SegmentedCache::new(2, PoolAllocator::new(size * 4, [size]));
//!
//! cache.get::<Page>(&1).unwrap();           // miss: constructed in probationary
//! cache.get_mut::<Page>(&1).unwrap().views += 1; // hit: promoted to protected
//!
//! assert_eq!(cache.protected_len(), 1);
//! assert_eq!(cache.peek::<Page>(&1).map(|p| p.views), Some(1));
//! assert_eq!(cache.to_string(), "Priority: [1]\nRegular: <empty>\n");
//! ```
//!
//! ## Thread Safety
//!
//! - [`SegmentedCache`]: Not thread-safe, designed for single-threaded use
//! - For concurrent access, wrap the whole cache in one lock
//!   (`SharedCache` with the `concurrency` feature)

use std::any::type_name;
use std::fmt;
use std::hash::Hash;
use std::mem;

use rustc_hash::FxHashMap;

use crate::alloc::{BlockId, PoolAllocator};
use crate::ds::{NodeId, RecencyList};
use crate::entry::{FromKey, KeyProvider, Variant};
use crate::error::{AllocError, CacheError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::SegmentedMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::SegmentedMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    CoreMetricsRecorder, MetricsReset, MetricsSnapshotProvider, SegmentedMetricsRecorder,
};
use crate::traits::ReadOnlyCache;

/// Indicates which segment an entry resides in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Segment {
    /// Entries seen once since creation or demotion.
    Probationary,
    /// Entries hit at least twice.
    Protected,
}

/// Where a key's handle currently lives.
#[derive(Copy, Clone, Debug)]
struct Slot {
    segment: Segment,
    node: NodeId,
}

/// Segmented LRU cache whose entries are constructed in a [`PoolAllocator`].
///
/// # Type Parameters
///
/// - `K`: Key type, must be `Clone + Eq + Hash`
/// - `E`: Entry type stored in the pools; usually an enum of variants, each
///   implementing [`Variant<E>`]
///
/// # Example
///
/// ```
/// use poolcache::alloc::PoolAllocator;
/// use poolcache::entry::{FromKey, KeyProvider};
/// use poolcache::policy::segmented::SegmentedCache;
///
/// #[derive(Debug)]
/// struct Tile { key: (i32, i32) }
/// impl KeyProvider<(i32, i32)> for Tile {
///     fn key(&self) -> &(i32, i32) { &self.key }
/// }
/// impl FromKey<(i32, i32)> for Tile {
///     fn from_key(key: &(i32, i32)) -> Self { Tile { key: *key } }
/// }
///
/// let size = std::mem::size_of::<Tile>();
/// let mut cache: SegmentedCache<(i32, i32), Tile> =
///     SegmentedCache::new(1, PoolAllocator::new(size * 2, [size]));
///
/// cache.get::<Tile>(&(0, 0)).unwrap();
/// cache.get::<Tile>(&(0, 1)).unwrap(); // probationary full: (0, 0) is destroyed
/// assert!(!cache.contains(&(0, 0)));
/// assert_eq!(cache.allocator().stats().releases, 1);
/// ```
pub struct SegmentedCache<K, E>
where
    K: Clone + Eq + Hash,
{
    /// Key -> segment and list node.
    index: FxHashMap<K, Slot>,

    /// Protected segment: head=MRU, tail=LRU.
    protected: RecencyList<BlockId>,
    /// Probationary segment: head=MRU/newest, tail=LRU.
    probationary: RecencyList<BlockId>,

    max_top_size: usize,
    max_low_size: usize,

    alloc: PoolAllocator<E>,

    #[cfg(feature = "metrics")]
    metrics: SegmentedMetrics,
}

impl<K, E> SegmentedCache<K, E>
where
    K: Clone + Eq + Hash,
{
    /// Creates a cache whose protected and probationary segments both hold
    /// up to `capacity` entries.
    ///
    /// `alloc` must provision a size class for every variant the cache will
    /// be asked to construct.
    pub fn new(capacity: usize, alloc: PoolAllocator<E>) -> Self {
        Self::with_segments(capacity, capacity, alloc)
    }

    /// Creates a cache with independent segment bounds.
    ///
    /// With `max_top_size == 0` nothing is ever promoted and a repeat hit only
    /// refreshes the entry's probationary position.
    pub fn with_segments(max_top_size: usize, max_low_size: usize, alloc: PoolAllocator<E>) -> Self {
        // Residency never exceeds the allocator's block count.
        let blocks = alloc.capacity();
        Self {
            index: FxHashMap::with_capacity_and_hasher(
                max_top_size.saturating_add(max_low_size).min(blocks),
                Default::default(),
            ),
            protected: RecencyList::with_capacity(max_top_size.min(blocks)),
            probationary: RecencyList::with_capacity(max_low_size.min(blocks)),
            max_top_size,
            max_low_size,
            alloc,
            #[cfg(feature = "metrics")]
            metrics: SegmentedMetrics::default(),
        }
    }

    /// Number of cached entries across both segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.protected.len() + self.probationary.len()
    }

    /// Alias of [`len`](Self::len).
    #[inline]
    pub fn size(&self) -> usize {
        self.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.protected.is_empty() && self.probationary.is_empty()
    }

    /// Alias of [`is_empty`](Self::is_empty).
    #[inline]
    pub fn empty(&self) -> bool {
        self.is_empty()
    }

    /// Entries in the protected segment.
    #[inline]
    pub fn protected_len(&self) -> usize {
        self.protected.len()
    }

    /// Entries in the probationary segment.
    #[inline]
    pub fn probationary_len(&self) -> usize {
        self.probationary.len()
    }

    /// Maximum entries held by both segments together.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_top_size.saturating_add(self.max_low_size)
    }

    #[inline]
    pub fn max_top_size(&self) -> usize {
        self.max_top_size
    }

    #[inline]
    pub fn max_low_size(&self) -> usize {
        self.max_low_size
    }

    /// Returns `true` if `key` is cached. Does not reorder.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// The allocator backing this cache.
    #[inline]
    pub fn allocator(&self) -> &PoolAllocator<E> {
        &self.alloc
    }

    /// Destroys every entry through the allocator.
    pub fn clear(&mut self) {
        self.release_all();

        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
    }

    /// Returns performance metrics.
    #[cfg(feature = "metrics")]
    #[inline]
    pub fn metrics(&self) -> &SegmentedMetrics {
        &self.metrics
    }

    fn release_all(&mut self) {
        while let Some(block) = self.probationary.pop_back() {
            self.alloc.destroy(block);
        }
        while let Some(block) = self.protected.pop_back() {
            self.alloc.destroy(block);
        }
        self.probationary.clear();
        self.protected.clear();
        self.index.clear();
    }

    fn block_of(&self, slot: Slot) -> Option<BlockId> {
        match slot.segment {
            Segment::Protected => self.protected.get(slot.node).copied(),
            Segment::Probationary => self.probationary.get(slot.node).copied(),
        }
    }
}

impl<K, E> SegmentedCache<K, E>
where
    K: Clone + Eq + Hash,
    E: KeyProvider<K>,
{
    /// Looks up `key`, constructing a `T` for it on a miss.
    ///
    /// # Errors
    ///
    /// - [`CacheError::TypeMismatch`] if the cached entry is not a `T`.
    /// - [`CacheError::Alloc`] if a miss could not be constructed.
    /// - [`CacheError::ZeroCapacity`] on a miss when the probationary segment
    ///   holds nothing.
    pub fn get<T>(&mut self, key: &K) -> Result<&T, CacheError>
    where
        T: Variant<E> + FromKey<K>,
    {
        let block = self.access::<T>(key)?;
        self.alloc
            .get(block)
            .and_then(T::as_variant)
            .ok_or(CacheError::TypeMismatch {
                expected: type_name::<T>(),
            })
    }

    /// Mutable counterpart of [`get`](Self::get); same segment transitions.
    pub fn get_mut<T>(&mut self, key: &K) -> Result<&mut T, CacheError>
    where
        T: Variant<E> + FromKey<K>,
    {
        let block = self.access::<T>(key)?;
        self.alloc
            .get_mut(block)
            .and_then(T::as_variant_mut)
            .ok_or(CacheError::TypeMismatch {
                expected: type_name::<T>(),
            })
    }

    /// Borrows the cached `T` for `key` without reordering or constructing.
    ///
    /// Returns `None` on a miss or when the entry holds another variant.
    pub fn peek<T>(&self, key: &K) -> Option<&T>
    where
        T: Variant<E>,
    {
        let slot = *self.index.get(key)?;
        let block = self.block_of(slot)?;
        self.alloc.get(block).and_then(T::as_variant)
    }

    /// Keys of the protected segment, MRU first.
    pub fn protected_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.protected
            .iter()
            .filter_map(|block| self.alloc.get(*block))
            .map(|entry| entry.key())
    }

    /// Keys of the probationary segment, MRU first.
    pub fn probationary_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.probationary
            .iter()
            .filter_map(|block| self.alloc.get(*block))
            .map(|entry| entry.key())
    }

    /// Writes both segments, MRU first, one line each.
    ///
    /// ```text
    /// Priority: [3, 1]
    /// Regular: <empty>
    /// ```
    pub fn render<W: fmt::Write>(&self, out: &mut W) -> fmt::Result
    where
        K: fmt::Debug,
    {
        write_segment(out, "Priority", self.protected_keys())?;
        write_segment(out, "Regular", self.probationary_keys())
    }

    /// Validates segment bounds, index/queue agreement, and allocator
    /// accounting.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantError`] naming the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.protected.len() > self.max_top_size {
            return Err(InvariantError::new(format!(
                "protected segment holds {} entries, bound is {}",
                self.protected.len(),
                self.max_top_size
            )));
        }
        if self.probationary.len() > self.max_low_size {
            return Err(InvariantError::new(format!(
                "probationary segment holds {} entries, bound is {}",
                self.probationary.len(),
                self.max_low_size
            )));
        }
        if self.index.len() != self.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but segments hold {} entries",
                self.index.len(),
                self.len()
            )));
        }
        if self.alloc.len() != self.len() {
            return Err(InvariantError::new(format!(
                "allocator holds {} live blocks but segments hold {} entries",
                self.alloc.len(),
                self.len()
            )));
        }

        for (segment, list) in [
            (Segment::Protected, &self.protected),
            (Segment::Probationary, &self.probationary),
        ] {
            for block in list.iter() {
                let entry = self.alloc.get(*block).ok_or_else(|| {
                    InvariantError::new(format!("{:?} block {:?} is not allocated", segment, block))
                })?;
                let slot = self.index.get(entry.key()).ok_or_else(|| {
                    InvariantError::new(format!("{:?} block {:?} has no index entry", segment, block))
                })?;
                if slot.segment != segment || list.get(slot.node) != Some(block) {
                    return Err(InvariantError::new(format!(
                        "index disagrees with {:?} segment for block {:?}",
                        segment, block
                    )));
                }
            }
        }
        Ok(())
    }

    /// Runs the segment state machine for `key` and returns the block now
    /// holding its entry.
    fn access<T>(&mut self, key: &K) -> Result<BlockId, CacheError>
    where
        T: Variant<E> + FromKey<K>,
    {
        let Some(slot) = self.index.get(key).copied() else {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_miss();

            return self.admit::<T>(key);
        };

        let block = self
            .block_of(slot)
            .filter(|block| self.alloc.get(*block).and_then(T::as_variant).is_some());
        let Some(block) = block else {
            #[cfg(feature = "metrics")]
            self.metrics.record_type_mismatch();

            tracing::debug!(
                expected = type_name::<T>(),
                "cached entry holds a different variant"
            );
            return Err(CacheError::TypeMismatch {
                expected: type_name::<T>(),
            });
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_get_hit();

        match slot.segment {
            Segment::Protected => {
                self.protected.move_to_front(slot.node);
                tracing::trace!(?block, "protected hit");
            },
            Segment::Probationary => self.promote(key, slot.node, block),
        }
        Ok(block)
    }

    /// Moves a probationary hit to the protected MRU, demoting the protected
    /// LRU first when the protected segment is full.
    fn promote(&mut self, key: &K, node: NodeId, block: BlockId) {
        if self.max_top_size == 0 {
            self.probationary.move_to_front(node);
            tracing::trace!(?block, "probationary hit refreshed");
            return;
        }

        if self.protected.len() >= self.max_top_size {
            self.demote_protected_lru();
        }

        self.probationary.remove(node);
        let node = self.protected.push_front(block);
        if let Some(slot) = self.index.get_mut(key) {
            *slot = Slot {
                segment: Segment::Protected,
                node,
            };
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_promotion();

        tracing::trace!(?block, "promoted to protected");
    }

    /// Moves the protected LRU entry to the probationary MRU. The entry keeps
    /// its block.
    fn demote_protected_lru(&mut self) {
        let Some(block) = self.protected.pop_back() else {
            return;
        };
        let node = self.probationary.push_front(block);
        if let Some(entry) = self.alloc.get(block) {
            if let Some(slot) = self.index.get_mut(entry.key()) {
                *slot = Slot {
                    segment: Segment::Probationary,
                    node,
                };
            }
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_demotion();

        tracing::debug!(?block, "demoted protected entry");
    }

    /// Destroys the probationary LRU entry and frees its block.
    fn evict_probationary_lru(&mut self) {
        let Some(block) = self.probationary.pop_back() else {
            return;
        };
        if let Some(entry) = self.alloc.take(block) {
            self.index.remove(entry.key());
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_evicted_entry();

        tracing::debug!(?block, "evicted probationary entry");
    }

    /// Constructs a new `T` for `key` at the probationary MRU.
    fn admit<T>(&mut self, key: &K) -> Result<BlockId, CacheError>
    where
        T: Variant<E> + FromKey<K>,
    {
        if self.max_low_size == 0 {
            return Err(CacheError::ZeroCapacity);
        }
        // Reject unprovisioned variants before evicting anything for them.
        if !self.alloc.supports::<T>() {
            #[cfg(feature = "metrics")]
            self.metrics.record_construct_failure();

            let err = AllocError::UnsupportedSizeClass {
                size: mem::size_of::<T>(),
            };
            tracing::warn!(error = %err, variant = type_name::<T>(), "cannot admit entry");
            return Err(err.into());
        }

        if self.probationary.len() >= self.max_low_size {
            self.evict_probationary_lru();
        }

        let block = match self.alloc.construct(T::from_key(key)) {
            Ok(block) => block,
            Err(err) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_construct_failure();

                return Err(err.into());
            },
        };

        let node = self.probationary.push_front(block);
        self.index.insert(
            key.clone(),
            Slot {
                segment: Segment::Probationary,
                node,
            },
        );

        #[cfg(feature = "metrics")]
        self.metrics.record_construct();

        tracing::trace!(?block, "admitted to probationary");
        Ok(block)
    }
}

fn write_segment<'a, W, K, I>(out: &mut W, label: &str, keys: I) -> fmt::Result
where
    W: fmt::Write,
    K: fmt::Debug + 'a,
    I: Iterator<Item = &'a K>,
{
    let mut keys = keys.peekable();
    if keys.peek().is_none() {
        return writeln!(out, "{}: <empty>", label);
    }
    write!(out, "{}: [", label)?;
    for (i, key) in keys.enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        write!(out, "{:?}", key)?;
    }
    out.write_str("]\n")
}

impl<K, E> Drop for SegmentedCache<K, E>
where
    K: Clone + Eq + Hash,
{
    fn drop(&mut self) {
        self.release_all();
    }
}

impl<K, E> fmt::Display for SegmentedCache<K, E>
where
    K: Clone + Eq + Hash + fmt::Debug,
    E: KeyProvider<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f)
    }
}

impl<K, E> fmt::Debug for SegmentedCache<K, E>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentedCache")
            .field("len", &self.len())
            .field("protected_len", &self.protected.len())
            .field("probationary_len", &self.probationary.len())
            .field("max_top_size", &self.max_top_size)
            .field("max_low_size", &self.max_low_size)
            .field("pool_blocks", &self.alloc.capacity())
            .finish_non_exhaustive()
    }
}

impl<K, E> ReadOnlyCache<K> for SegmentedCache<K, E>
where
    K: Clone + Eq + Hash,
{
    #[inline]
    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    #[inline]
    fn len(&self) -> usize {
        SegmentedCache::len(self)
    }

    #[inline]
    fn capacity(&self) -> usize {
        SegmentedCache::capacity(self)
    }
}

#[cfg(feature = "metrics")]
impl<K, E> MetricsSnapshotProvider<SegmentedMetricsSnapshot> for SegmentedCache<K, E>
where
    K: Clone + Eq + Hash,
{
    fn snapshot(&self) -> SegmentedMetricsSnapshot {
        let pool = self.alloc.stats();
        SegmentedMetricsSnapshot {
            get_calls: self.metrics.get_calls,
            get_hits: self.metrics.get_hits,
            get_misses: self.metrics.get_misses,
            evicted_entries: self.metrics.evicted_entries,
            clears: self.metrics.clears,
            promotions: self.metrics.promotions,
            demotions: self.metrics.demotions,
            constructs: self.metrics.constructs,
            construct_failures: self.metrics.construct_failures,
            type_mismatches: self.metrics.type_mismatches,
            pool_allocations: pool.allocations,
            pool_releases: pool.releases,
            cache_len: self.len(),
            protected_len: self.protected.len(),
            probationary_len: self.probationary.len(),
            capacity: self.capacity(),
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, E> MetricsReset for SegmentedCache<K, E>
where
    K: Clone + Eq + Hash,
{
    fn reset_metrics(&mut self) {
        self.metrics = SegmentedMetrics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    /// Single-variant entry keyed by a short name.
    #[derive(Debug, PartialEq)]
    struct Item {
        key: &'static str,
        hits: u32,
    }

    impl KeyProvider<&'static str> for Item {
        fn key(&self) -> &&'static str {
            &self.key
        }
    }

    impl FromKey<&'static str> for Item {
        fn from_key(key: &&'static str) -> Self {
            Item { key: *key, hits: 0 }
        }
    }

    fn item_cache(capacity: usize) -> SegmentedCache<&'static str, Item> {
        let size = size_of::<Item>();
        SegmentedCache::new(capacity, PoolAllocator::new(size * capacity * 2, [size]))
    }

    fn protected(cache: &SegmentedCache<&'static str, Item>) -> Vec<&'static str> {
        cache.protected_keys().copied().collect()
    }

    fn probationary(cache: &SegmentedCache<&'static str, Item>) -> Vec<&'static str> {
        cache.probationary_keys().copied().collect()
    }

    // ==============================================
    // Basic Operations
    // ==============================================

    mod basic_operations {
        use super::*;

        #[test]
        fn new_cache_is_empty() {
            let cache = item_cache(4);
            assert!(cache.is_empty());
            assert!(cache.empty());
            assert_eq!(cache.len(), 0);
            assert_eq!(cache.size(), 0);
            assert_eq!(cache.capacity(), 8);
            assert_eq!(cache.max_top_size(), 4);
            assert_eq!(cache.max_low_size(), 4);
        }

        #[test]
        fn miss_constructs_entry_for_key() {
            let mut cache = item_cache(4);
            let item = cache.get::<Item>(&"a").unwrap();
            assert_eq!(item, &Item { key: "a", hits: 0 });
            assert_eq!(cache.len(), 1);
            assert!(cache.contains(&"a"));
            assert_eq!(cache.allocator().stats().allocations, 1);
        }

        #[test]
        fn get_mut_changes_are_visible_on_next_get() {
            let mut cache = item_cache(4);
            cache.get_mut::<Item>(&"a").unwrap().hits = 7;
            assert_eq!(cache.get::<Item>(&"a").unwrap().hits, 7);
        }

        #[test]
        fn peek_does_not_construct_or_reorder() {
            let mut cache = item_cache(2);
            assert_eq!(cache.peek::<Item>(&"a"), None);
            assert!(cache.is_empty());

            cache.get::<Item>(&"a").unwrap();
            cache.get::<Item>(&"b").unwrap();
            assert!(cache.peek::<Item>(&"a").is_some());
            assert_eq!(probationary(&cache), vec!["b", "a"]);
            assert_eq!(cache.protected_len(), 0);
        }

        #[test]
        fn clear_destroys_every_entry() {
            let mut cache = item_cache(2);
            cache.get::<Item>(&"a").unwrap();
            cache.get::<Item>(&"a").unwrap();
            cache.get::<Item>(&"b").unwrap();

            cache.clear();

            assert!(cache.is_empty());
            assert!(!cache.contains(&"a"));
            assert!(cache.allocator().is_empty());
            assert_eq!(cache.allocator().stats().releases, 2);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn read_only_trait_matches_inherent_methods() {
            let mut cache = item_cache(3);
            cache.get::<Item>(&"a").unwrap();
            let ro: &dyn ReadOnlyCache<&'static str> = &cache;
            assert!(ro.contains(&"a"));
            assert_eq!(ro.len(), 1);
            assert_eq!(ro.capacity(), 6);
            assert!(!ro.is_empty());
        }
    }

    // ==============================================
    // Segment Behavior
    // ==============================================

    mod segment_behavior {
        use super::*;

        #[test]
        fn new_key_enters_probationary() {
            let mut cache = item_cache(2);
            cache.get::<Item>(&"a").unwrap();
            assert_eq!(probationary(&cache), vec!["a"]);
            assert!(protected(&cache).is_empty());
        }

        #[test]
        fn second_hit_promotes_to_protected() {
            let mut cache = item_cache(2);
            cache.get::<Item>(&"a").unwrap();
            cache.get::<Item>(&"a").unwrap();
            assert_eq!(protected(&cache), vec!["a"]);
            assert!(probationary(&cache).is_empty());
        }

        #[test]
        fn protected_hit_moves_to_front_preserving_rest() {
            let mut cache = item_cache(3);
            for key in ["a", "b", "c"] {
                cache.get::<Item>(&key).unwrap();
                cache.get::<Item>(&key).unwrap();
            }
            assert_eq!(protected(&cache), vec!["c", "b", "a"]);

            cache.get::<Item>(&"a").unwrap();
            assert_eq!(protected(&cache), vec!["a", "c", "b"]);
        }

        #[test]
        fn full_protected_demotes_lru_to_probationary_front() {
            let mut cache = item_cache(2);
            for key in ["a", "b"] {
                cache.get::<Item>(&key).unwrap();
                cache.get::<Item>(&key).unwrap();
            }
            cache.get::<Item>(&"c").unwrap();
            let releases = cache.allocator().stats().releases;

            cache.get::<Item>(&"c").unwrap();

            assert_eq!(protected(&cache), vec!["c", "b"]);
            assert_eq!(probationary(&cache), vec!["a"]);
            assert_eq!(cache.allocator().stats().releases, releases);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn demoted_entry_keeps_its_state() {
            let mut cache = item_cache(1);
            cache.get_mut::<Item>(&"a").unwrap().hits = 3;
            cache.get::<Item>(&"a").unwrap();
            cache.get::<Item>(&"b").unwrap();
            cache.get::<Item>(&"b").unwrap(); // demotes "a"

            assert_eq!(probationary(&cache), vec!["a"]);
            assert_eq!(cache.peek::<Item>(&"a").map(|i| i.hits), Some(3));
        }

        #[test]
        fn zero_protected_segment_only_refreshes() {
            let size = size_of::<Item>();
            let mut cache: SegmentedCache<&'static str, Item> =
                SegmentedCache::with_segments(0, 2, PoolAllocator::new(size * 4, [size]));
            cache.get::<Item>(&"a").unwrap();
            cache.get::<Item>(&"b").unwrap();
            cache.get::<Item>(&"a").unwrap();

            assert!(protected(&cache).is_empty());
            assert_eq!(probationary(&cache), vec!["a", "b"]);
            cache.check_invariants().unwrap();
        }
    }

    // ==============================================
    // Eviction Behavior
    // ==============================================

    mod eviction_behavior {
        use super::*;

        #[test]
        fn reference_scenario_two_by_two() {
            let mut cache = item_cache(2);
            for key in ["A", "B", "C", "D"] {
                cache.get::<Item>(&key).unwrap();
            }
            assert_eq!(probationary(&cache), vec!["D", "C"]);
            assert!(protected(&cache).is_empty());
            assert!(!cache.contains(&"A"));
            assert!(!cache.contains(&"B"));

            cache.get::<Item>(&"C").unwrap();
            assert_eq!(protected(&cache), vec!["C"]);
            assert_eq!(probationary(&cache), vec!["D"]);

            cache.get::<Item>(&"E").unwrap();
            assert_eq!(probationary(&cache), vec!["E", "D"]);

            cache.get::<Item>(&"D").unwrap();
            assert_eq!(protected(&cache), vec!["D", "C"]);
            assert_eq!(probationary(&cache), vec!["E"]);

            cache.get::<Item>(&"C").unwrap();
            assert_eq!(protected(&cache), vec!["C", "D"]);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn only_probationary_overflow_frees_memory() {
            let mut cache = item_cache(2);
            cache.get::<Item>(&"a").unwrap();
            cache.get::<Item>(&"b").unwrap();
            assert_eq!(cache.allocator().stats().releases, 0);

            cache.get::<Item>(&"c").unwrap();
            assert_eq!(cache.allocator().stats().releases, 1);
            assert_eq!(cache.allocator().len(), 2);
        }

        #[test]
        fn hot_entry_survives_cold_churn() {
            let mut cache = item_cache(3);
            cache.get::<Item>(&"hot").unwrap();
            cache.get::<Item>(&"hot").unwrap();

            for key in ["c0", "c1", "c2", "c3", "c4", "c5", "c6"] {
                cache.get::<Item>(&key).unwrap();
            }

            assert!(cache.contains(&"hot"));
            assert_eq!(protected(&cache), vec!["hot"]);
            assert_eq!(probationary(&cache), vec!["c6", "c5", "c4"]);
        }

        #[test]
        fn huge_capacity_reserves_only_what_the_pools_can_hold() {
            let size = size_of::<Item>();
            let mut cache: SegmentedCache<&'static str, Item> =
                SegmentedCache::new(usize::MAX / 2, PoolAllocator::new(size * 4, [size]));
            assert_eq!(cache.capacity(), usize::MAX - 1);

            cache.get::<Item>(&"a").unwrap();
            assert_eq!(cache.len(), 1);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn zero_capacity_rejects_admission() {
            let mut cache = item_cache(0);
            assert_eq!(cache.get::<Item>(&"a"), Err(CacheError::ZeroCapacity));
            assert!(cache.is_empty());
        }
    }

    // ==============================================
    // Polymorphic Entries
    // ==============================================

    mod polymorphic_entries {
        use super::*;

        #[derive(Debug, PartialEq)]
        struct Thumb {
            key: u32,
            pixels: [u8; 12],
        }

        #[derive(Debug, PartialEq)]
        struct Page {
            key: u32,
            body: [u64; 3],
        }

        #[derive(Debug, PartialEq)]
        struct Blob {
            key: u32,
            data: [u8; 20],
        }

        #[derive(Debug)]
        enum Entry {
            Thumb(Thumb),
            Page(Page),
            Blob(Blob),
        }

        impl KeyProvider<u32> for Entry {
            fn key(&self) -> &u32 {
                match self {
                    Entry::Thumb(t) => &t.key,
                    Entry::Page(p) => &p.key,
                    Entry::Blob(b) => &b.key,
                }
            }
        }

        macro_rules! variant {
            ($ty:ident, $init:expr) => {
                impl Variant<Entry> for $ty {
                    fn wrap(self) -> Entry {
                        Entry::$ty(self)
                    }
                    fn as_variant(entry: &Entry) -> Option<&Self> {
                        match entry {
                            Entry::$ty(v) => Some(v),
                            _ => None,
                        }
                    }
                    fn as_variant_mut(entry: &mut Entry) -> Option<&mut Self> {
                        match entry {
                            Entry::$ty(v) => Some(v),
                            _ => None,
                        }
                    }
                }

                impl FromKey<u32> for $ty {
                    fn from_key(key: &u32) -> Self {
                        $init(*key)
                    }
                }
            };
        }

        variant!(Thumb, |key| Thumb { key, pixels: [1; 12] });
        variant!(Page, |key| Page { key, body: [2; 3] });
        variant!(Blob, |key| Blob { key, data: [3; 20] });

        fn mixed_cache(capacity: usize) -> SegmentedCache<u32, Entry> {
            let classes = [size_of::<Thumb>(), size_of::<Page>()];
            let budget = capacity * 2 * size_of::<Page>();
            SegmentedCache::new(capacity, PoolAllocator::new(budget, classes))
        }

        #[test]
        fn variants_land_in_their_own_size_class() {
            let mut cache = mixed_cache(4);
            cache.get::<Thumb>(&1).unwrap();
            cache.get::<Page>(&2).unwrap();

            let alloc = cache.allocator();
            assert_eq!(alloc.pool(size_of::<Thumb>()).map(|p| p.len()), Some(1));
            assert_eq!(alloc.pool(size_of::<Page>()).map(|p| p.len()), Some(1));
        }

        #[test]
        fn hit_with_other_variant_is_rejected_without_reordering() {
            let mut cache = mixed_cache(4);
            cache.get::<Thumb>(&1).unwrap();
            cache.get::<Thumb>(&2).unwrap();

            let err = cache.get::<Page>(&1).unwrap_err();
            assert!(matches!(err, CacheError::TypeMismatch { .. }));
            assert_eq!(cache.protected_len(), 0);
            assert_eq!(cache.probationary_keys().copied().collect::<Vec<_>>(), vec![2, 1]);

            assert_eq!(cache.get::<Thumb>(&1).unwrap().pixels, [1; 12]);
        }

        #[cfg(feature = "metrics")]
        #[test]
        fn type_mismatch_counts_as_a_get_call() {
            let mut cache = mixed_cache(4);
            cache.get::<Thumb>(&1).unwrap(); // miss
            cache.get::<Page>(&1).unwrap_err(); // mismatch
            cache.get::<Thumb>(&1).unwrap(); // hit

            let snap = cache.snapshot();
            assert_eq!(snap.get_calls, 3);
            assert_eq!(snap.type_mismatches, 1);
            assert!((snap.hit_ratio() - 1.0 / 3.0).abs() < 1e-9);
        }

        #[test]
        fn unprovisioned_variant_fails_before_evicting() {
            let mut cache = mixed_cache(1);
            cache.get::<Thumb>(&1).unwrap();

            let err = cache.get::<Blob>(&2).unwrap_err();
            assert_eq!(
                err,
                CacheError::Alloc(AllocError::UnsupportedSizeClass {
                    size: size_of::<Blob>()
                })
            );
            assert!(cache.contains(&1));
            assert!(!cache.contains(&2));
        }

        #[test]
        fn exhausted_size_class_surfaces_out_of_capacity() {
            let classes = [size_of::<Thumb>(), size_of::<Page>()];
            // room for exactly one Page
            let alloc = PoolAllocator::new(size_of::<Page>(), classes);
            let mut cache: SegmentedCache<u32, Entry> = SegmentedCache::new(4, alloc);

            cache.get::<Page>(&1).unwrap();
            let err = cache.get::<Page>(&2).unwrap_err();
            assert_eq!(
                err,
                CacheError::Alloc(AllocError::OutOfCapacity {
                    size_class: size_of::<Page>()
                })
            );
            assert_eq!(cache.len(), 1);
            cache.check_invariants().unwrap();
        }
    }

    // ==============================================
    // Rendering and Teardown
    // ==============================================

    mod rendering {
        use super::*;

        #[test]
        fn empty_cache_renders_both_segments_empty() {
            let cache = item_cache(2);
            assert_eq!(cache.to_string(), "Priority: <empty>\nRegular: <empty>\n");
        }

        #[test]
        fn render_lists_keys_mru_first() {
            let mut cache = item_cache(2);
            cache.get::<Item>(&"a").unwrap();
            cache.get::<Item>(&"a").unwrap();
            cache.get::<Item>(&"b").unwrap();
            cache.get::<Item>(&"c").unwrap();

            let mut out = String::new();
            cache.render(&mut out).unwrap();
            assert_eq!(out, "Priority: [\"a\"]\nRegular: [\"c\", \"b\"]\n");
        }

        #[test]
        fn debug_reports_segment_lengths() {
            let mut cache = item_cache(2);
            cache.get::<Item>(&"a").unwrap();
            let dbg = format!("{:?}", cache);
            assert!(dbg.contains("probationary_len: 1"));
        }
    }

    mod teardown {
        use super::*;
        use std::cell::Cell;
        use std::rc::Rc;

        thread_local! {
            static DROPS: Cell<u32> = const { Cell::new(0) };
        }

        struct Tracked {
            key: u8,
            _guard: Rc<()>,
        }

        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.with(|d| d.set(d.get() + 1));
            }
        }

        impl KeyProvider<u8> for Tracked {
            fn key(&self) -> &u8 {
                &self.key
            }
        }

        impl FromKey<u8> for Tracked {
            fn from_key(key: &u8) -> Self {
                Tracked {
                    key: *key,
                    _guard: Rc::new(()),
                }
            }
        }

        #[test]
        fn eviction_and_drop_destroy_each_entry_once() {
            DROPS.with(|d| d.set(0));
            let size = size_of::<Tracked>();
            {
                let mut cache: SegmentedCache<u8, Tracked> =
                    SegmentedCache::new(1, PoolAllocator::new(size * 2, [size]));
                cache.get::<Tracked>(&1).unwrap();
                cache.get::<Tracked>(&1).unwrap();
                cache.get::<Tracked>(&2).unwrap();
                cache.get::<Tracked>(&3).unwrap(); // evicts 2
                assert_eq!(DROPS.with(Cell::get), 1);
            }
            assert_eq!(DROPS.with(Cell::get), 3);
        }
    }

    #[cfg(feature = "metrics")]
    mod metrics_counters {
        use super::*;

        #[test]
        fn snapshot_counts_segment_transitions() {
            let mut cache = item_cache(1);
            cache.get::<Item>(&"a").unwrap(); // miss
            cache.get::<Item>(&"a").unwrap(); // promote
            cache.get::<Item>(&"b").unwrap(); // miss
            cache.get::<Item>(&"b").unwrap(); // promote, demote a
            cache.get::<Item>(&"c").unwrap(); // miss, evict a

            let snap = cache.snapshot();
            assert_eq!(snap.get_calls, 5);
            assert_eq!(snap.get_hits, 2);
            assert_eq!(snap.get_misses, 3);
            assert_eq!(snap.promotions, 2);
            assert_eq!(snap.demotions, 1);
            assert_eq!(snap.evicted_entries, 1);
            assert_eq!(snap.constructs, 3);
            assert_eq!(snap.pool_allocations, 3);
            assert_eq!(snap.pool_releases, 1);
            assert_eq!(snap.cache_len, 2);

            cache.reset_metrics();
            assert_eq!(cache.snapshot().get_calls, 0);
        }
    }
}
