//! Lock-wrapped cache for shared use.
//!
//! Every lookup may reorder segments, so reads and writes alike take one
//! exclusive [`parking_lot::Mutex`]. Borrowed entries never escape the lock:
//! callers receive them inside a closure.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use poolcache::builder::CacheBuilder;
//! use poolcache::entry::{FromKey, KeyProvider};
//! use poolcache::sync::SharedCache;
//!
//! struct Doc { id: u32 }
//! impl KeyProvider<u32> for Doc {
//!     fn key(&self) -> &u32 { &self.id }
//! }
//! impl FromKey<u32> for Doc {
//!     fn from_key(id: &u32) -> Self { Doc { id: *id } }
//! }
//!
//! let cache = Arc::new(SharedCache::new(
//!     CacheBuilder::new(8).variant::<Doc>().build::<u32, Doc>(),
//! ));
//!
//! let worker = {
//!     let cache = Arc::clone(&cache);
//!     std::thread::spawn(move || cache.get_with::<Doc, _>(&1, |doc| doc.id))
//! };
//! assert_eq!(worker.join().unwrap().unwrap(), 1);
//! assert!(cache.contains(&1));
//! ```

use std::fmt;
use std::hash::Hash;

use parking_lot::{Mutex, MutexGuard};

use crate::entry::{FromKey, KeyProvider, Variant};
use crate::error::CacheError;
use crate::policy::segmented::SegmentedCache;
use crate::traits::{ConcurrentCache, ReadOnlyCache};

/// [`SegmentedCache`] behind a single mutex.
pub struct SharedCache<K, E>
where
    K: Clone + Eq + Hash,
{
    inner: Mutex<SegmentedCache<K, E>>,
}

impl<K, E> SharedCache<K, E>
where
    K: Clone + Eq + Hash,
{
    pub fn new(cache: SegmentedCache<K, E>) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Destroys every entry.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Locks the cache for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, SegmentedCache<K, E>> {
        self.inner.lock()
    }

    pub fn into_inner(self) -> SegmentedCache<K, E> {
        self.inner.into_inner()
    }
}

impl<K, E> SharedCache<K, E>
where
    K: Clone + Eq + Hash,
    E: KeyProvider<K>,
{
    /// Runs [`SegmentedCache::get`] and hands the entry to `f` under the lock.
    pub fn get_with<T, R>(&self, key: &K, f: impl FnOnce(&T) -> R) -> Result<R, CacheError>
    where
        T: Variant<E> + FromKey<K>,
    {
        let mut cache = self.inner.lock();
        cache.get::<T>(key).map(f)
    }

    /// Mutable counterpart of [`get_with`](Self::get_with).
    pub fn get_mut_with<T, R>(
        &self,
        key: &K,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, CacheError>
    where
        T: Variant<E> + FromKey<K>,
    {
        let mut cache = self.inner.lock();
        cache.get_mut::<T>(key).map(f)
    }

    /// Runs [`SegmentedCache::peek`] under the lock; no reordering.
    pub fn peek_with<T, R>(&self, key: &K, f: impl FnOnce(&T) -> R) -> Option<R>
    where
        T: Variant<E>,
    {
        let cache = self.inner.lock();
        cache.peek::<T>(key).map(f)
    }
}

impl<K, E> ReadOnlyCache<K> for SharedCache<K, E>
where
    K: Clone + Eq + Hash,
{
    fn contains(&self, key: &K) -> bool {
        SharedCache::contains(self, key)
    }

    fn len(&self) -> usize {
        SharedCache::len(self)
    }

    fn capacity(&self) -> usize {
        SharedCache::capacity(self)
    }
}

impl<K, E> ConcurrentCache for SharedCache<K, E>
where
    K: Clone + Eq + Hash + Send,
    E: Send,
{
}

impl<K, E> fmt::Debug for SharedCache<K, E>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(cache) => f.debug_struct("SharedCache").field("inner", &*cache).finish(),
            None => f
                .debug_struct("SharedCache")
                .field("inner", &"<locked>")
                .finish(),
        }
    }
}
