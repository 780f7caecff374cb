// ==============================================
// SHARED CACHE CONCURRENCY TESTS (integration)
// ==============================================

use std::sync::Arc;
use std::thread;

use poolcache::builder::CacheBuilder;
use poolcache::entry::{FromKey, KeyProvider};
use poolcache::sync::SharedCache;
use poolcache::traits::ConcurrentCache;

#[derive(Debug)]
struct Hits {
    key: u64,
    count: u64,
}

impl KeyProvider<u64> for Hits {
    fn key(&self) -> &u64 {
        &self.key
    }
}

impl FromKey<u64> for Hits {
    fn from_key(key: &u64) -> Self {
        Hits {
            key: *key,
            count: 0,
        }
    }
}

fn shared(capacity: usize) -> Arc<SharedCache<u64, Hits>> {
    Arc::new(SharedCache::new(
        CacheBuilder::new(capacity)
            .variant::<Hits>()
            .build::<u64, Hits>(),
    ))
}

fn assert_concurrent<C: ConcurrentCache>(_: &C) {}

#[test]
fn shared_cache_is_concurrent() {
    let cache = shared(4);
    assert_concurrent(&*cache);
}

#[test]
fn concurrent_updates_to_resident_key_are_not_lost() {
    let cache = shared(8);
    let threads = 4;
    let per_thread = 250;

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..per_thread {
                    cache
                        .get_mut_with::<Hits, _>(&7, |h| h.count += 1)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        cache.peek_with::<Hits, _>(&7, |h| h.count),
        Some(threads * per_thread)
    );
}

#[test]
fn mixed_workload_keeps_invariants() {
    let cache = shared(4);

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..500u64 {
                    let key = (i * 7 + t) % 16;
                    cache.get_with::<Hits, _>(&key, |h| h.key).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let guard = cache.lock();
    assert!(guard.len() <= guard.capacity());
    guard.check_invariants().unwrap();
}
