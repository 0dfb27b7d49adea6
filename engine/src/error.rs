//! Error types shared by the queue engine, the directory and the HTTP layer.
//!
//! Soft outcomes (duplicate rejected, merge, unknown message id) are not
//! errors: they surface as `Ok(None)` or `false` from the queue operations.

/// Application-level errors for message, queue and directory operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineUpError {
    #[error("message body cannot be empty")]
    EmptyBody,

    #[error("message body of {size} bytes exceeds the {limit} byte limit")]
    MessageTooLarge { size: usize, limit: usize },

    #[error("priority cannot be negative: {0}")]
    InvalidPriority(i32),

    #[error("invalid queue options: {0}")]
    InvalidOptions(String),

    #[error("invalid queue name: {0}")]
    InvalidQueueName(String),

    #[error("unknown queue type: {0}")]
    UnknownQueueType(String),

    #[error("queue not found: {0}")]
    QueueNotFound(String),

    #[error("queue already exists: {0}")]
    QueueAlreadyExists(String),

    #[error("security code does not match for queue: {0}")]
    Unauthorized(String),
}

impl LineUpError {
    /// Whether the error was caused by caller input rather than directory state.
    #[inline]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LineUpError::EmptyBody
                | LineUpError::MessageTooLarge { .. }
                | LineUpError::InvalidPriority(_)
                | LineUpError::InvalidOptions(_)
                | LineUpError::InvalidQueueName(_)
                | LineUpError::UnknownQueueType(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LineUpError>;
