//! Entry capabilities for pooled cache values.
//!
//! A cache instance stores one entry type `E`. Heterogeneous entries are
//! modelled as a closed set: `E` is usually an enum, and every concrete
//! variant payload `T` implements [`Variant<E>`] so the cache can wrap a
//! freshly built `T` into `E` and borrow it back out with a checked match.
//!
//! ```text
//!   get::<Thumbnail>(&key)
//!        │
//!        ├── miss ──► Thumbnail::from_key(&key) ──► wrap() ──► Entry::Thumbnail(..)
//!        │                                                         │
//!        │                                        pooled in size class
//!        │                                        size_of::<Thumbnail>()
//!        │
//!        └── hit ───► Thumbnail::as_variant(&Entry) ──► Some(&Thumbnail)
//!                                                   └─► None => TypeMismatch
//! ```
//!
//! Every type is trivially a variant of itself, so single-type caches need no
//! extra impls.
//!
//! ## Example
//!
//! ```
//! use poolcache::entry::{FromKey, KeyProvider, Variant};
//!
//! struct Small { key: u32, hits: u8 }
//! struct Large { key: u32, payload: [u64; 4] }
//!
//! enum Entry { Small(Small), Large(Large) }
//!
//! impl KeyProvider<u32> for Entry {
//!     fn key(&self) -> &u32 {
//!         match self {
//!             Entry::Small(s) => &s.key,
//!             Entry::Large(l) => &l.key,
//!         }
//!     }
//! }
//!
//! impl Variant<Entry> for Small {
//!     fn wrap(self) -> Entry { Entry::Small(self) }
//!     fn as_variant(entry: &Entry) -> Option<&Self> {
//!         match entry { Entry::Small(s) => Some(s), _ => None }
//!     }
//!     fn as_variant_mut(entry: &mut Entry) -> Option<&mut Self> {
//!         match entry { Entry::Small(s) => Some(s), _ => None }
//!     }
//! }
//!
//! impl FromKey<u32> for Small {
//!     fn from_key(key: &u32) -> Self { Small { key: *key, hits: 0 } }
//! }
//!
//! let entry: Entry = Small::from_key(&7).wrap();
//! assert!(entry.matches(&7));
//! assert_eq!(Small::as_variant(&entry).map(|s| s.hits), Some(0));
//! ```

/// Capability shared by every cached entry: it knows the key it was built for.
pub trait KeyProvider<K> {
    /// Returns the key this entry was constructed with.
    fn key(&self) -> &K;

    /// Returns `true` if this entry was constructed for `key`.
    #[inline]
    fn matches(&self, key: &K) -> bool
    where
        K: PartialEq,
    {
        self.key() == key
    }
}

/// A concrete payload type that is one member of the closed entry set `E`.
///
/// Every type is also a `Variant` of itself, so a bare `.wrap()` call is
/// ambiguous: name the target type, as in `let entry: Entry = v.wrap()`.
pub trait Variant<E>: Sized {
    /// Moves the payload into the entry type.
    fn wrap(self) -> E;

    /// Borrows the payload back out of an entry, if the entry holds this variant.
    fn as_variant(entry: &E) -> Option<&Self>;

    /// Mutable counterpart of [`as_variant`](Self::as_variant).
    fn as_variant_mut(entry: &mut E) -> Option<&mut Self>;
}

impl<E> Variant<E> for E {
    #[inline]
    fn wrap(self) -> E {
        self
    }

    #[inline]
    fn as_variant(entry: &E) -> Option<&Self> {
        Some(entry)
    }

    #[inline]
    fn as_variant_mut(entry: &mut E) -> Option<&mut Self> {
        Some(entry)
    }
}

/// Builds a fresh entry for a key on a cache miss.
pub trait FromKey<K> {
    /// Constructs the entry that will be cached under `key`.
    fn from_key(key: &K) -> Self;
}
