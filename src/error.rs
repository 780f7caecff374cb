//! Error types for the poolcache library.
//!
//! ## Key Components
//!
//! - [`AllocError`]: Returned by the pool allocator when a size class is not
//!   provisioned or a pool has no free block left.
//! - [`CacheError`]: Returned by [`SegmentedCache::get`](crate::policy::segmented::SegmentedCache::get)
//!   and friends; wraps allocator failures and checked variant mismatches.
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods).
//! - [`ConfigError`]: Returned when construction parameters are invalid
//!   (e.g. zero capacity, zero-byte size class).
//!
//! ## Example Usage
//!
//! ```
//! use poolcache::alloc::PoolAllocator;
//! use poolcache::error::{AllocError, ConfigError};
//!
//! // Fallible constructor for user-configurable parameters
//! let alloc: Result<PoolAllocator<u64>, ConfigError> = PoolAllocator::try_new(64, [8]);
//! assert!(alloc.is_ok());
//!
//! // A zero-byte size class is caught without panicking
//! let bad = PoolAllocator::<u64>::try_new(64, [0]);
//! assert!(bad.is_err());
//!
//! // Requests for a size that was never registered are rejected
//! let mut alloc = PoolAllocator::<u64>::new(64, [16]);
//! assert_eq!(
//!     alloc.construct(7u64).unwrap_err(),
//!     AllocError::UnsupportedSizeClass { size: 8 }
//! );
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// AllocError
// ---------------------------------------------------------------------------

/// Failure raised by a [`Pool`](crate::alloc::Pool) or
/// [`PoolAllocator`](crate::alloc::PoolAllocator).
///
/// Both kinds are non-recoverable at the allocator layer and are propagated
/// to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// Every block of the size class is in use.
    #[error("size class {size_class} is out of capacity")]
    OutOfCapacity {
        /// Byte size of the exhausted size class.
        size_class: usize,
    },
    /// The requested byte size was never registered with the allocator.
    #[error("size class {size} is not provisioned")]
    UnsupportedSizeClass {
        /// Byte size that was requested.
        size: usize,
    },
}

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Failure raised by a [`SegmentedCache`](crate::policy::segmented::SegmentedCache) lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Constructing a new entry on a miss failed in the allocator.
    #[error(transparent)]
    Alloc(#[from] AllocError),
    /// The cached entry for the key holds a different variant than requested.
    #[error("cached entry holds a different variant than `{expected}`")]
    TypeMismatch {
        /// Type name of the variant the caller asked for.
        expected: &'static str,
    },
    /// The probationary segment has no room, so no entry can ever be admitted.
    #[error("cache has zero probationary capacity")]
    ZeroCapacity,
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` methods (e.g.
/// [`SegmentedCache::check_invariants`](crate::policy::segmented::SegmentedCache::check_invariants)).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache or allocator configuration is invalid.
///
/// Produced by fallible constructors such as
/// [`PoolAllocator::try_new`](crate::alloc::PoolAllocator::try_new) and
/// [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build).
///
/// # Example
///
/// ```
/// use poolcache::builder::CacheBuilder;
///
/// let err = CacheBuilder::new(0).size_class(16).try_build::<u32, u64>().unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- AllocError -------------------------------------------------------

    #[test]
    fn alloc_display_names_size_class() {
        let err = AllocError::OutOfCapacity { size_class: 32 };
        assert_eq!(err.to_string(), "size class 32 is out of capacity");

        let err = AllocError::UnsupportedSizeClass { size: 24 };
        assert_eq!(err.to_string(), "size class 24 is not provisioned");
    }

    // -- CacheError -------------------------------------------------------

    #[test]
    fn cache_error_wraps_alloc_error_transparently() {
        let err: CacheError = AllocError::OutOfCapacity { size_class: 8 }.into();
        assert_eq!(err, CacheError::Alloc(AllocError::OutOfCapacity { size_class: 8 }));
        assert_eq!(err.to_string(), "size class 8 is out of capacity");
    }

    #[test]
    fn type_mismatch_names_expected_type() {
        let err = CacheError::TypeMismatch { expected: "Widget" };
        assert!(err.to_string().contains("Widget"));
    }

    #[test]
    fn errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<AllocError>();
        assert_error::<CacheError>();
        assert_error::<InvariantError>();
        assert_error::<ConfigError>();
    }

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("queue length mismatch");
        assert_eq!(err.to_string(), "queue length mismatch");
        assert_eq!(err.message(), "queue length mismatch");
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be > 0");
        assert_eq!(err.to_string(), "capacity must be > 0");
        assert_eq!(err.clone(), err);
    }
}
