//! Building blocks of the LineUp queues.
//!
//! Module organization:
//! - `bucket_list.rs` - Slab-backed doubly-linked list with O(1) delete by handle
//! - `changing_priority_queue.rs` - Bucketed priority engine with in-place priority bumps
//! - `fifo_queue.rs` - Blocking FIFO with optional in-flight body dedup
//! - `gate.rs` - Flag-then-lock gate making `clear()` stop-the-world
//! - `metrics.rs` - Per-queue atomic counters
//! - `time.rs` - Timestamp, hash type aliases

mod bucket_list;
mod changing_priority_queue;
mod fifo_queue;
mod gate;
mod metrics;
mod time;

pub use bucket_list::{BucketList, Handle};
pub use changing_priority_queue::{
    AddOutcome, BumpOutcome, ChangingPriorityQueue, DuplicatePolicy,
};
pub use fifo_queue::FifoQueue;
pub use gate::ClearGate;
pub use metrics::QueueMetrics;
pub use time::{now_ms, GxBuildHasher, GxDashMap, GxHashSet};
