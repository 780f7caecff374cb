//! Replacement policies over pooled entries.
//!
//! | Policy                                  | Admission     | Eviction            |
//! |-----------------------------------------|---------------|---------------------|
//! | [`SegmentedCache`](segmented::SegmentedCache) | Probationary  | Probationary LRU    |

pub mod segmented;
