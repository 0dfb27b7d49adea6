//! Queue behavior tests.
//!
//! Split by concern:
//! - `fifo.rs` - arrival order, blocking gets, delete
//! - `dedup.rs` - duplicate rejection in the FIFO and priority variants
//! - `priority.rs` - priority ordering and clamping
//! - `merging.rs` - duplicate merging and priority bumps
//! - `concurrent.rs` - clear linearizability and racing producers/consumers
//! - `directory.rs` - QueueManager create/get/delete and security codes

use super::*;
use crate::error::LineUpError;
use crate::protocol::{QueueOptions, QueueType};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

mod priority;

fn setup() -> Arc<QueueManager> {
    QueueManager::new()
}

fn queue(queue_type: QueueType) -> Arc<dyn LineUpQueue> {
    build_queue(QueueOptions::new(queue_type)).unwrap()
}

fn queue_with(options: QueueOptions) -> Arc<dyn LineUpQueue> {
    build_queue(options).unwrap()
}

/// Add with default delay, returning the message id if it was queued.
fn add(q: &dyn LineUpQueue, body: &str, priority: i32) -> Option<u64> {
    q.add_message(body, 0, priority).unwrap().map(|m| m.id())
}

/// Drain without blocking, returning bodies in delivery order.
fn drain(q: &dyn LineUpQueue) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(m) = q.get_message(Duration::ZERO) {
        out.push(m.body().to_string());
    }
    out
}
