//! Fixed-capacity, single size-class block pool.
//!
//! A [`Pool`] reserves `block_count` slots up front and never grows. Blocks are
//! handed out as [`BlockId`] handles (size class + slot index) rather than
//! addresses, so membership is a range check and a released handle can never
//! alias a live block of another pool.
//!
//! ## Architecture
//!
//! ```text
//!   Pool { block_size: 32, block_count: 4 }
//!
//!   slots                          free (stack, top on the right)
//!   ┌─────┬──────────────────┐     ┌───────────┐
//!   │ [0] │ Some(entry)      │     │ 3, 1      │
//!   │ [1] │ None             │◄────┤           │
//!   │ [2] │ Some(entry)      │     └───────────┘
//!   │ [3] │ None             │◄──── next allocate() pops this one
//!   └─────┴──────────────────┘
//!
//!   allocate(v) : pop free index ─► slots[i] = Some(v) ─► BlockId { 32, i }
//!   release(id) : contains(id)?  ─► slots[i].take()    ─► push i on free
//! ```
//!
//! ## Memory footprint
//!
//! Each block is an `Option<T>` slot, not `block_size` raw bytes. The block
//! size labels the pool and is what handles carry; the storage actually
//! reserved is `block_count * size_of::<Option<T>>()`.
//!
//! ## Operations
//!
//! | Operation  | Time | Notes                                         |
//! |------------|------|-----------------------------------------------|
//! | `allocate` | O(1) | `OutOfCapacity` when every block is used      |
//! | `release`  | O(1) | Foreign ids and double releases are no-ops    |
//! | `contains` | O(1) | Range check, independent of used/free state   |
//!
//! ## Example
//!
//! ```
//! use poolcache::alloc::Pool;
//! use poolcache::error::AllocError;
//!
//! let mut pool: Pool<&str> = Pool::new(16, 2);
//! let a = pool.allocate("a").unwrap();
//! let _b = pool.allocate("b").unwrap();
//! assert_eq!(pool.allocate("c"), Err(AllocError::OutOfCapacity { size_class: 16 }));
//!
//! assert_eq!(pool.release(a), Some("a"));
//! assert!(pool.allocate("c").is_ok());
//! ```

use crate::error::AllocError;

/// Opaque handle to one block of a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    size_class: usize,
    index: usize,
}

impl BlockId {
    /// Byte size of the size class this block belongs to.
    #[inline]
    pub fn size_class(self) -> usize {
        self.size_class
    }

    /// Slot index of this block within its pool.
    #[inline]
    pub fn index(self) -> usize {
        self.index
    }
}

/// Fixed-size block arena for one size class.
#[derive(Debug)]
pub struct Pool<T> {
    block_size: usize,
    slots: Box<[Option<T>]>,
    /// Free slot indices; the lowest index sits on top of a fresh pool.
    free: Vec<usize>,
    len: usize,
}

impl<T> Pool<T> {
    /// Creates a pool serving `block_count` blocks of `block_size` bytes.
    ///
    /// All storage is reserved here; the pool never resizes.
    pub fn new(block_size: usize, block_count: usize) -> Self {
        Self {
            block_size,
            slots: (0..block_count).map(|_| None).collect(),
            free: (0..block_count).rev().collect(),
            len: 0,
        }
    }

    /// Stores `value` in a free block and returns its handle.
    ///
    /// # Errors
    ///
    /// [`AllocError::OutOfCapacity`] when every block is in use. `value` is
    /// dropped in that case.
    pub fn allocate(&mut self, value: T) -> Result<BlockId, AllocError> {
        let index = self.free.pop().ok_or(AllocError::OutOfCapacity {
            size_class: self.block_size,
        })?;
        debug_assert!(self.slots[index].is_none(), "free list handed out a used block");
        self.slots[index] = Some(value);
        self.len += 1;
        Ok(BlockId {
            size_class: self.block_size,
            index,
        })
    }

    /// Frees the block named by `id` and returns the value it held.
    ///
    /// Returns `None` without touching the pool when `id` is not contained in
    /// this pool or the block is already free.
    pub fn release(&mut self, id: BlockId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        let value = self.slots.get_mut(id.index)?.take()?;
        self.free.push(id.index);
        self.len -= 1;
        Some(value)
    }

    /// Returns `true` if `id` names a block of this pool, used or free.
    #[inline]
    pub fn contains(&self, id: BlockId) -> bool {
        id.size_class == self.block_size && id.index < self.slots.len()
    }

    /// Returns `true` if `id` names a block of this pool that is in use.
    #[inline]
    pub fn is_allocated(&self, id: BlockId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: BlockId) -> Option<&T> {
        if !self.contains(id) {
            return None;
        }
        self.slots.get(id.index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut T> {
        if !self.contains(id) {
            return None;
        }
        self.slots.get_mut(id.index).and_then(Option::as_mut)
    }

    /// Byte size of every block this pool serves.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks in use.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of blocks reserved at construction.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of blocks still free.
    #[inline]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }
}
