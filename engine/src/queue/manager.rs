//! Queue directory: named queues guarded by per-queue security codes.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use compact_str::CompactString;
use dashmap::mapref::entry::Entry;
use tracing::{info, warn};

use super::line_up::{build_queue, LineUpQueue};
use super::types::{now_ms, GxDashMap};
use super::validation::validate_queue_name;
use crate::error::{LineUpError, Result};
use crate::protocol::{QueueInfo, QueueOptions, QueueType};

/// Constant-time byte slice comparison to prevent timing attacks.
#[inline]
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// A queue registered in the directory.
pub struct NamedQueue {
    name: CompactString,
    security_code: String,
    created_at: u64,
    queue: Arc<dyn LineUpQueue>,
}

impl NamedQueue {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    #[inline]
    pub fn queue(&self) -> &Arc<dyn LineUpQueue> {
        &self.queue
    }

    /// Descriptor including the security code; only for the creator.
    pub fn info(&self) -> QueueInfo {
        QueueInfo {
            name: self.name.to_string(),
            security_code: self.security_code.clone(),
            queue_type: self.queue.queue_type(),
            options: self.queue.options().clone(),
        }
    }

    #[inline]
    fn authorize(&self, security_code: &str) -> bool {
        constant_time_eq(security_code.as_bytes(), self.security_code.as_bytes())
    }
}

impl fmt::Debug for NamedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedQueue")
            .field("name", &self.name)
            .field("queue_type", &self.queue.queue_type())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl std::ops::Deref for NamedQueue {
    type Target = dyn LineUpQueue;

    fn deref(&self) -> &Self::Target {
        self.queue.as_ref()
    }
}

pub struct QueueManager {
    pub(crate) queues: GxDashMap<CompactString, Arc<NamedQueue>>,
    pub(crate) defaults: QueueOptions,
    pub(crate) shutdown_flag: AtomicBool,
}

impl QueueManager {
    /// Directory whose queues start from the built-in `QueueOptions`.
    pub fn new() -> Arc<Self> {
        Self::with_defaults(QueueOptions::default())
    }

    /// Directory whose queues start from `defaults`; only the queue type is
    /// chosen per queue.
    pub fn with_defaults(defaults: QueueOptions) -> Arc<Self> {
        Arc::new(Self {
            queues: GxDashMap::default(),
            defaults,
            shutdown_flag: AtomicBool::new(false),
        })
    }

    /// Default options with `queue_type` swapped in.
    #[inline]
    pub fn options_for(&self, queue_type: QueueType) -> QueueOptions {
        QueueOptions {
            queue_type,
            ..self.defaults.clone()
        }
    }

    /// Register a new queue. A missing security code is generated.
    pub fn create_queue(
        &self,
        name: &str,
        security_code: Option<&str>,
        options: QueueOptions,
    ) -> Result<Arc<NamedQueue>> {
        validate_queue_name(name)?;

        let security_code = match security_code.map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };

        match self.queues.entry(CompactString::from(name)) {
            Entry::Occupied(_) => Err(LineUpError::QueueAlreadyExists(name.to_string())),
            Entry::Vacant(vacant) => {
                let queue_type = options.queue_type;
                let named = Arc::new(NamedQueue {
                    name: CompactString::from(name),
                    security_code,
                    created_at: now_ms(),
                    queue: build_queue(options)?,
                });
                vacant.insert(Arc::clone(&named));
                info!(queue = %name, queue_type = %queue_type, "Queue created");
                Ok(named)
            }
        }
    }

    /// Look up a queue and check its security code.
    pub fn get_queue(&self, name: &str, security_code: &str) -> Result<Arc<NamedQueue>> {
        let named = self
            .queues
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LineUpError::QueueNotFound(name.to_string()))?;

        if !named.authorize(security_code) {
            warn!(queue = %name, "Security code mismatch");
            return Err(LineUpError::Unauthorized(name.to_string()));
        }
        Ok(named)
    }

    /// Address of a queue for clients. Queues are addressed by name.
    pub fn queue_url(&self, name: &str) -> Result<String> {
        self.queues
            .get(name)
            .map(|entry| entry.key().to_string())
            .ok_or_else(|| LineUpError::QueueNotFound(name.to_string()))
    }

    /// Queue names starting with `prefix`, sorted.
    pub fn list_queues(&self, prefix: Option<&str>) -> Vec<String> {
        let prefix = prefix.unwrap_or("");
        let mut names: Vec<String> = self
            .queues
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().to_string())
            .collect();
        names.sort_unstable();
        names
    }

    #[inline]
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// In-flight messages across all queues.
    pub fn total_messages(&self) -> usize {
        self.queues
            .iter()
            .map(|entry| entry.value().num_messages())
            .sum()
    }

    /// Unregister and close a queue. Blocked getters return empty.
    pub fn delete_queue(&self, name: &str) -> bool {
        match self.queues.remove(name) {
            Some((_, named)) => {
                named.close();
                info!(queue = %name, "Queue deleted");
                true
            }
            None => false,
        }
    }

    /// Close every queue so blocked getters return.
    pub fn shutdown(&self) {
        if self.shutdown_flag.swap(true, Ordering::SeqCst) {
            warn!("Queue manager already shut down");
            return;
        }
        for entry in self.queues.iter() {
            entry.value().close();
        }
        info!(queues = self.queues.len(), "Queue manager shut down");
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }
}
