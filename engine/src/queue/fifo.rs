//! Arrival-ordered queues: `AllowDuplicates` and `RejectDuplicates`.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::line_up::{new_message, LineUpQueue};
use super::types::{FifoQueue, QueueMetrics};
use crate::error::Result;
use crate::protocol::{Message, QueueOptions, QueueStats, QueueType};

pub struct FifoLineUp {
    options: QueueOptions,
    fifo: FifoQueue,
    metrics: QueueMetrics,
}

impl FifoLineUp {
    /// `RejectDuplicates` keeps an in-flight body set; every other type
    /// queues duplicates side by side.
    pub fn new(options: QueueOptions) -> Self {
        let reject_duplicates = options.queue_type == QueueType::RejectDuplicates;
        Self {
            options,
            fifo: FifoQueue::new(reject_duplicates),
            metrics: QueueMetrics::new(),
        }
    }
}

impl LineUpQueue for FifoLineUp {
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

        if !self.fifo.push(Arc::clone(&message)) {
            self.metrics.record_reject();
            debug!(message_id = message.id(), "Duplicate body rejected");
            return Ok(None);
        }
        self.metrics.record_add();
        Ok(Some(message))
    }

    fn get_message(&self, timeout: Duration) -> Option<Arc<Message>> {
        let message = self.fifo.pop_timeout(timeout)?;
        self.metrics.record_deliver();
        Some(message)
    }

    fn delete_message(&self, id: u64) -> bool {
        match self.fifo.remove(id) {
            Some(_) => {
                self.metrics.record_delete();
                true
            }
            None => false,
        }
    }

    fn num_messages(&self) -> usize {
        self.fifo.len()
    }

    fn clear(&self) {
        let dropped = self.fifo.clear();
        self.metrics.record_clear();
        debug!(dropped, "Queue cleared");
    }

    fn close(&self) {
        self.fifo.close();
    }

    fn stats(&self) -> QueueStats {
        self.metrics.snapshot(self.fifo.len())
    }
}
