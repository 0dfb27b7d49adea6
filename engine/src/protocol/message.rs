//! Message record and lookup keys.
//!
//! A `Message` is shared as `Arc<Message>` between the queue structures and
//! callers. Everything but `priority` is fixed at construction; priority is an
//! atomic so merging queues can raise it in place while the message is queued.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{LineUpError, Result};
use crate::queue::types::now_ms;

/// Priority assigned when the caller does not specify one.
pub const DEFAULT_PRIORITY: i32 = 1;

/// Process-wide message id sequence. Ids start at 1.
static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

#[inline]
fn next_message_id() -> u64 {
    NEXT_MESSAGE_ID.fetch_add(1, AtomicOrdering::Relaxed)
}

#[derive(Debug)]
pub struct Message {
    id: u64,
    body: Arc<str>,
    delay_seconds: u32,
    digest: [u8; 32],
    created_at: u64,
    priority: AtomicI32,
}

impl Message {
    /// Build a new message with a fresh id.
    ///
    /// Fails on an empty body or a negative priority.
    pub fn new(body: impl Into<Arc<str>>, delay_seconds: u32, priority: i32) -> Result<Self> {
        let body = body.into();
        if body.is_empty() {
            return Err(LineUpError::EmptyBody);
        }
        if priority < 0 {
            return Err(LineUpError::InvalidPriority(priority));
        }

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(body.as_bytes()));

        Ok(Self {
            id: next_message_id(),
            digest,
            body,
            delay_seconds,
            created_at: now_ms(),
            priority: AtomicI32::new(priority),
        })
    }

    #[inline(always)]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline(always)]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Shared handle to the body, used as an identity key without copying.
    #[inline]
    pub fn shared_body(&self) -> Arc<str> {
        Arc::clone(&self.body)
    }

    /// Requested visibility delay. Stored and reported, never enforced.
    #[inline(always)]
    pub fn delay_seconds(&self) -> u32 {
        self.delay_seconds
    }

    #[inline(always)]
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    #[inline(always)]
    pub fn priority(&self) -> i32 {
        self.priority.load(AtomicOrdering::Acquire)
    }

    /// Overwrite the priority. Only the priority engine calls this, while it
    /// holds the per-entry lock of the message.
    #[inline]
    pub(crate) fn set_priority(&self, priority: i32) {
        self.priority.store(priority, AtomicOrdering::Release);
    }

    /// SHA-256 of the body as lowercase hex.
    pub fn content_digest(&self) -> String {
        self.digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Body equality, short-circuited on the stored digest.
    #[inline]
    pub fn same_body(&self, other: &Message) -> bool {
        self.body.len() == other.body.len() && self.digest == other.digest
    }

    /// Identity key of this message in the requested mode.
    #[inline]
    pub fn key(&self, mode: IdentityMode) -> MessageKey {
        match mode {
            IdentityMode::ById => MessageKey::Id(self.id),
            IdentityMode::ByBody => MessageKey::Body(self.shared_body()),
        }
    }

    /// Delivery order: higher priority first, then lower id.
    /// Messages with identical bodies compare as equivalent.
    pub fn compare_priority(&self, other: &Message) -> Ordering {
        if self.same_body(other) {
            return Ordering::Equal;
        }
        other
            .priority()
            .cmp(&self.priority())
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Wire representation with the priority as currently observed.
    pub fn view(&self) -> MessageView {
        MessageView {
            message_id: self.id,
            body: self.body.to_string(),
            delay_seconds: self.delay_seconds,
            content_digest: self.content_digest(),
            created_at: self.created_at,
            priority: self.priority(),
        }
    }
}

impl Eq for Message {}

impl PartialEq for Message {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialEq<MessageKey> for Message {
    fn eq(&self, key: &MessageKey) -> bool {
        match key {
            MessageKey::Id(id) => self.id == *id,
            MessageKey::Body(body) => *self.body == **body,
        }
    }
}

// ============== Lookup Keys ==============

/// Which field identifies a message inside an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    ById,
    ByBody,
}

/// Probe key for dedup and removal: matches a stored message by id or by body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Id(u64),
    Body(Arc<str>),
}

impl MessageKey {
    #[inline]
    pub fn by_id(id: u64) -> Self {
        MessageKey::Id(id)
    }

    #[inline]
    pub fn by_body(body: impl Into<Arc<str>>) -> Self {
        MessageKey::Body(body.into())
    }
}

// ============== Wire View ==============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub message_id: u64,
    pub body: String,
    pub delay_seconds: u32,
    pub content_digest: String,
    pub created_at: u64,
    pub priority: i32,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        message.view()
    }
}
