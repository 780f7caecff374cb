//! DHAT heap profiler for poolcache.
//!
//! Run with: cargo run --bin dhat_profile --release --features dhat-heap
//! View results: Open dhat-heap.json in <https://nnethercote.github.io/dh_view/dh_view.html>
//!
//! Pools reserve all block storage up front, so steady-state lookups should
//! show no heap traffic beyond the key index.

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::mem::size_of;

use poolcache::builder::CacheBuilder;
use poolcache::entry::{FromKey, KeyProvider, Variant};
use poolcache::policy::segmented::SegmentedCache;

struct Small {
    key: u64,
    value: u64,
}

struct Large {
    key: u64,
    payload: [u64; 7],
}

enum Entry {
    Small(Small),
    Large(Large),
}

impl KeyProvider<u64> for Entry {
    fn key(&self) -> &u64 {
        match self {
            Entry::Small(s) => &s.key,
            Entry::Large(l) => &l.key,
        }
    }
}

impl Variant<Entry> for Small {
    fn wrap(self) -> Entry {
        Entry::Small(self)
    }
    fn as_variant(entry: &Entry) -> Option<&Self> {
        match entry {
            Entry::Small(s) => Some(s),
            Entry::Large(_) => None,
        }
    }
    fn as_variant_mut(entry: &mut Entry) -> Option<&mut Self> {
        match entry {
            Entry::Small(s) => Some(s),
            Entry::Large(_) => None,
        }
    }
}

impl Variant<Entry> for Large {
    fn wrap(self) -> Entry {
        Entry::Large(self)
    }
    fn as_variant(entry: &Entry) -> Option<&Self> {
        match entry {
            Entry::Large(l) => Some(l),
            Entry::Small(_) => None,
        }
    }
    fn as_variant_mut(entry: &mut Entry) -> Option<&mut Self> {
        match entry {
            Entry::Large(l) => Some(l),
            Entry::Small(_) => None,
        }
    }
}

impl FromKey<u64> for Small {
    fn from_key(key: &u64) -> Self {
        Small {
            key: *key,
            value: key.wrapping_mul(31),
        }
    }
}

impl FromKey<u64> for Large {
    fn from_key(key: &u64) -> Self {
        Large {
            key: *key,
            payload: [*key; 7],
        }
    }
}

/// Simple XorShift64 RNG for deterministic workloads.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (u64::MAX as f64);
        (self.next_u64() as f64) * SCALE
    }
}

/// Every fourth key is a large entry.
fn touch(cache: &mut SegmentedCache<u64, Entry>, key: u64) -> u64 {
    if key % 4 == 0 {
        cache.get::<Large>(&key).map(|l| l.payload[0]).unwrap_or(0)
    } else {
        cache.get::<Small>(&key).map(|s| s.value).unwrap_or(0)
    }
}

/// Run a hotset workload: 90% of accesses hit 10% of keys.
fn hotset_workload(cache: &mut SegmentedCache<u64, Entry>, operations: usize, universe: u64, seed: u64) {
    let mut rng = XorShift64::new(seed);
    let hot_size = (universe as f64 * 0.1) as u64;

    for _ in 0..operations {
        let key = if rng.next_f64() < 0.9 {
            rng.next_u64() % hot_size
        } else {
            hot_size + (rng.next_u64() % (universe - hot_size))
        };
        std::hint::black_box(touch(cache, key));
    }
}

/// Run a scan workload: sequential access pattern.
fn scan_workload(cache: &mut SegmentedCache<u64, Entry>, operations: usize, universe: u64) {
    for i in 0..operations {
        std::hint::black_box(touch(cache, (i as u64) % universe));
    }
}

/// Run eviction churn: only new keys.
fn eviction_churn(cache: &mut SegmentedCache<u64, Entry>, operations: usize, base: u64) {
    for i in 0..operations {
        std::hint::black_box(touch(cache, base + i as u64));
    }
}

fn profile_segmented() {
    println!("=== Profiling pooled segmented LRU ===");
    let capacity = 2048;
    let operations = 100_000;
    let universe = 16_384;

    let mut cache = CacheBuilder::new(capacity)
        .size_classes([size_of::<Small>(), size_of::<Large>()])
        .build::<u64, Entry>();

    for i in 0..capacity as u64 {
        touch(&mut cache, i);
    }

    hotset_workload(&mut cache, operations, universe, 42);
    scan_workload(&mut cache, operations / 2, universe);
    eviction_churn(&mut cache, operations / 4, universe * 2);

    let stats = cache.allocator().stats();
    println!("  Final size: {}", cache.len());
    println!(
        "  Protected/probationary: {}/{}",
        cache.protected_len(),
        cache.probationary_len()
    );
    println!(
        "  Pool allocations/releases/failures: {}/{}/{}",
        stats.allocations, stats.releases, stats.failures
    );
}

fn main() {
    let _profiler = dhat::Profiler::new_heap();

    profile_segmented();

    println!("\nDHAT profile written to dhat-heap.json");
}
