//! The queue contract shared by every LineUp variant, and the factory that
//! picks a variant from `QueueOptions`.

use std::sync::Arc;
use std::time::Duration;

use super::fifo::FifoLineUp;
use super::priority::PriorityLineUp;
use super::validation::validate_body;
use crate::error::Result;
use crate::protocol::{Message, QueueOptions, QueueStats, QueueType};

/// A message queue. All operations are safe to call from many threads.
pub trait LineUpQueue: Send + Sync {
    fn queue_type(&self) -> QueueType;

    fn options(&self) -> &QueueOptions;

    /// Queue a new message.
    ///
    /// `Ok(None)` means the variant's duplicate policy absorbed the message:
    /// it was rejected, or merged into a queued copy.
    fn add_message(
        &self,
        body: &str,
        delay_seconds: u32,
        priority: i32,
    ) -> Result<Option<Arc<Message>>>;

    /// Take the next message, waiting up to `timeout` for one. A zero
    /// timeout never blocks.
    fn get_message(&self, timeout: Duration) -> Option<Arc<Message>>;

    /// Up to `n` messages without blocking. Stops at the first empty get.
    fn get_messages(&self, n: usize) -> Vec<Arc<Message>> {
        let mut messages = Vec::with_capacity(n.min(64));
        while messages.len() < n {
            match self.get_message(Duration::ZERO) {
                Some(message) => messages.push(message),
                None => break,
            }
        }
        messages
    }

    /// Remove a queued message by id. `false` if it is unknown or already
    /// delivered.
    fn delete_message(&self, id: u64) -> bool;

    /// Messages currently in flight, from the backing structure's own
    /// counter. O(1); merges and rejects never move it.
    fn num_messages(&self) -> usize;

    fn clear(&self);

    /// Wake every blocked getter. Later gets return without waiting.
    fn close(&self);

    fn stats(&self) -> QueueStats;
}

/// Build a queue for `options.queue_type`.
pub fn build_queue(options: QueueOptions) -> Result<Arc<dyn LineUpQueue>> {
    options.validate()?;

    let queue: Arc<dyn LineUpQueue> = match options.queue_type {
        QueueType::AllowDuplicates | QueueType::RejectDuplicates => {
            Arc::new(FifoLineUp::new(options))
        }
        QueueType::PriorityWithDuplicates
        | QueueType::PriorityWithoutDuplicates
        | QueueType::PriorityMergingDuplicates => Arc::new(PriorityLineUp::new(options)?),
    };
    Ok(queue)
}

/// Validate the body against the queue limits and build the message.
#[inline]
pub(crate) fn new_message(
    options: &QueueOptions,
    body: &str,
    delay_seconds: u32,
    priority: i32,
) -> Result<Arc<Message>> {
    validate_body(body, options.max_message_size)?;
    Ok(Arc::new(Message::new(body, delay_seconds, priority)?))
}
