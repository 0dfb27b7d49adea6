//! Priority-ordered queues backed by `ChangingPriorityQueue`.
//!
//! | Type                        | Engine key | On duplicate body        |
//! |-----------------------------|------------|--------------------------|
//! | `PriorityWithDuplicates`    | id         | queued side by side      |
//! | `PriorityWithoutDuplicates` | body       | rejected                 |
//! | `PriorityMergingDuplicates` | body       | bumps the queued copy    |

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::line_up::{new_message, LineUpQueue};
use super::types::{AddOutcome, ChangingPriorityQueue, DuplicatePolicy, QueueMetrics};
use crate::error::Result;
use crate::protocol::{IdentityMode, Message, MessageKey, QueueOptions, QueueStats, QueueType};

pub struct PriorityLineUp {
    options: QueueOptions,
    engine: ChangingPriorityQueue,
    metrics: QueueMetrics,
}

impl PriorityLineUp {
    pub fn new(options: QueueOptions) -> Result<Self> {
        let (mode, policy) = match options.queue_type {
            QueueType::PriorityWithoutDuplicates => (IdentityMode::ByBody, DuplicatePolicy::Reject),
            QueueType::PriorityMergingDuplicates => (IdentityMode::ByBody, DuplicatePolicy::Merge),
            _ => (IdentityMode::ById, DuplicatePolicy::Merge),
        };
        let engine = ChangingPriorityQueue::new(options.max_priority, mode)?
            .with_duplicate_policy(policy);

        Ok(Self {
            options,
            engine,
            metrics: QueueMetrics::new(),
        })
    }

    /// Current priority of the queued message with this body, if the queue
    /// is body-keyed.
    pub fn priority_of_body(&self, body: &str) -> Option<i32> {
        self.engine.priority_of(&MessageKey::by_body(body))
    }
}

impl LineUpQueue for PriorityLineUp {
    fn queue_type(&self) -> QueueType {
        self.options.queue_type
    }

    fn options(&self) -> &QueueOptions {
        &self.options
    }

    fn add_message(
        &self,
        body: &str,
        delay_seconds: u32,
        priority: i32,
    ) -> Result<Option<Arc<Message>>> {
        let message = new_message(&self.options, body, delay_seconds, priority)?;

        match self.engine.add(Arc::clone(&message))? {
            AddOutcome::Inserted => {
                self.metrics.record_add();
                Ok(Some(message))
            }
            AddOutcome::Rejected => {
                self.metrics.record_reject();
                debug!(message_id = message.id(), "Duplicate body rejected");
                Ok(None)
            }
            outcome => {
                self.metrics.record_merge();
                debug!(
                    message_id = message.id(),
                    priority,
                    moved = outcome == AddOutcome::Merged,
                    "Duplicate merged into queued message"
                );
                Ok(None)
            }
        }
    }

    fn get_message(&self, timeout: Duration) -> Option<Arc<Message>> {
        let message = self.engine.poll_timeout(timeout)?;
        self.metrics.record_deliver();
        Some(message)
    }

    fn delete_message(&self, id: u64) -> bool {
        match self.engine.remove(&MessageKey::by_id(id)) {
            Some(_) => {
                self.metrics.record_delete();
                true
            }
            None => false,
        }
    }

    fn num_messages(&self) -> usize {
        self.engine.len()
    }

    fn clear(&self) {
        let dropped = self.engine.clear();
        self.metrics.record_clear();
        debug!(dropped, "Queue cleared");
    }

    fn close(&self) {
        self.engine.close();
    }

    fn stats(&self) -> QueueStats {
        self.metrics.snapshot(self.engine.len())
    }
}
