//! Fixed-block, size-classed allocation.
//!
//! - [`Pool`]: one size class, fixed block count, O(1) allocate/release.
//! - [`PoolAllocator`]: routes construct/destroy requests to the pool whose
//!   size class matches the concrete variant being stored.

pub mod allocator;
pub mod pool;

pub use allocator::{AllocatorStats, PoolAllocator};
pub use pool::{BlockId, Pool};
