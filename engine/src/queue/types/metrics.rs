//! Per-queue metrics with atomic counters for O(1) stats queries.
//!
//! Only lifetime totals live here. The in-flight count belongs to the
//! backing structure, which updates it in the same step that queues or
//! removes a message.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::protocol::QueueStats;

pub struct QueueMetrics {
    pub total_added: AtomicU64,
    pub total_merged: AtomicU64,
    pub total_rejected: AtomicU64,
    pub total_delivered: AtomicU64,
    pub total_deleted: AtomicU64,
    pub total_clears: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self {
            total_added: AtomicU64::new(0),
            total_merged: AtomicU64::new(0),
            total_rejected: AtomicU64::new(0),
            total_delivered: AtomicU64::new(0),
            total_deleted: AtomicU64::new(0),
            total_clears: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn record_add(&self) {
        self.total_added.fetch_add(1, Ordering::Relaxed);
    }

    /// The message was folded into an already queued duplicate.
    #[inline(always)]
    pub fn record_merge(&self) {
        self.total_merged.fetch_add(1, Ordering::Relaxed);
    }

    /// The message was dropped as a duplicate.
    #[inline(always)]
    pub fn record_reject(&self) {
        self.total_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_deliver(&self) {
        self.total_delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_delete(&self) {
        self.total_deleted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_clear(&self) {
        self.total_clears.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, num_messages: usize) -> QueueStats {
        QueueStats {
            num_messages,
            total_added: self.total_added.load(Ordering::Relaxed),
            total_merged: self.total_merged.load(Ordering::Relaxed),
            total_rejected: self.total_rejected.load(Ordering::Relaxed),
            total_delivered: self.total_delivered.load(Ordering::Relaxed),
            total_deleted: self.total_deleted.load(Ordering::Relaxed),
            total_clears: self.total_clears.load(Ordering::Relaxed),
        }
    }
}

impl Default for QueueMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let m = QueueMetrics::new();
        for _ in 0..3 {
            m.record_add();
        }
        m.record_merge();
        m.record_reject();
        m.record_deliver();
        m.record_delete();
        m.record_clear();

        let stats = m.snapshot(1);
        assert_eq!(stats.num_messages, 1);
        assert_eq!(stats.total_added, 3);
        assert_eq!(stats.total_merged, 1);
        assert_eq!(stats.total_rejected, 1);
        assert_eq!(stats.total_delivered, 1);
        assert_eq!(stats.total_deleted, 1);
        assert_eq!(stats.total_clears, 1);
    }
}
