//! Queue module - in-memory message queues and the directory holding them.
//!
//! ## Module Organization
//!
//! - `types/` - BucketList, ChangingPriorityQueue, FifoQueue, ClearGate, QueueMetrics
//! - `line_up.rs` - `LineUpQueue` contract and the `build_queue` factory
//! - `fifo.rs` - AllowDuplicates / RejectDuplicates
//! - `priority.rs` - PriorityWithDuplicates / PriorityWithoutDuplicates / PriorityMergingDuplicates
//! - `manager.rs` - QueueManager directory (names, security codes, lifecycle)
//! - `validation.rs` - Queue name and body validation

mod fifo;
mod line_up;
mod manager;
mod priority;
pub mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use fifo::FifoLineUp;
pub use line_up::{build_queue, LineUpQueue};
pub use manager::{NamedQueue, QueueManager};
pub use priority::PriorityLineUp;
pub use validation::{validate_body, validate_queue_name, MAX_QUEUE_NAME_LENGTH};
