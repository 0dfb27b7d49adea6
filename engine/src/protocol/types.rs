//! Queue configuration and reporting types.
//!
//! Contains QueueType, QueueOptions, QueueStats and QueueInfo.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LineUpError, Result};

/// Duplicate-handling and ordering policy of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QueueType {
    /// FIFO, duplicates coexist.
    #[default]
    AllowDuplicates,
    /// FIFO, an in-flight body cannot be queued twice.
    RejectDuplicates,
    /// Priority order, duplicates coexist.
    PriorityWithDuplicates,
    /// Priority order, an in-flight body cannot be queued twice.
    PriorityWithoutDuplicates,
    /// Priority order, a duplicate raises the priority of the queued copy.
    PriorityMergingDuplicates,
}

impl QueueType {
    pub const ALL: [QueueType; 5] = [
        QueueType::AllowDuplicates,
        QueueType::RejectDuplicates,
        QueueType::PriorityWithDuplicates,
        QueueType::PriorityWithoutDuplicates,
        QueueType::PriorityMergingDuplicates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueType::AllowDuplicates => "AllowDuplicates",
            QueueType::RejectDuplicates => "RejectDuplicates",
            QueueType::PriorityWithDuplicates => "PriorityWithDuplicates",
            QueueType::PriorityWithoutDuplicates => "PriorityWithoutDuplicates",
            QueueType::PriorityMergingDuplicates => "PriorityMergingDuplicates",
        }
    }

    #[inline]
    pub fn is_priority(&self) -> bool {
        matches!(
            self,
            QueueType::PriorityWithDuplicates
                | QueueType::PriorityWithoutDuplicates
                | QueueType::PriorityMergingDuplicates
        )
    }

    /// Parse an optional selector: empty means the default type.
    pub fn from_selector(selector: Option<&str>) -> Result<Self> {
        match selector.map(str::trim) {
            None | Some("") => Ok(QueueType::default()),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for QueueType {
    type Err = LineUpError;

    /// Case-insensitive. `PriorityQueue` is accepted as the legacy name of
    /// the merging priority queue.
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered == "priorityqueue" {
            return Ok(QueueType::PriorityMergingDuplicates);
        }
        QueueType::ALL
            .into_iter()
            .find(|t| t.as_str().to_ascii_lowercase() == lowered)
            .ok_or_else(|| LineUpError::UnknownQueueType(s.to_string()))
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============== Queue Options ==============

/// Per-queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueOptions {
    #[serde(default)]
    pub queue_type: QueueType,
    /// Delay applied when a message is added without one.
    #[serde(default)]
    pub delay_seconds: u32,
    /// Highest priority bucket, inclusive. Only used by priority queues.
    #[serde(default = "QueueOptions::default_max_priority")]
    pub max_priority: i32,
    /// Largest accepted body, in bytes.
    #[serde(default = "QueueOptions::default_max_message_size")]
    pub max_message_size: usize,
}

impl QueueOptions {
    pub const DEFAULT_MAX_PRIORITY: i32 = 10;
    pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 65_536;
    /// Upper bound on `max_priority`; every level allocates a bucket.
    pub const PRIORITY_LIMIT: i32 = 1024;

    fn default_max_priority() -> i32 {
        Self::DEFAULT_MAX_PRIORITY
    }

    fn default_max_message_size() -> usize {
        Self::DEFAULT_MAX_MESSAGE_SIZE
    }

    pub fn new(queue_type: QueueType) -> Self {
        Self {
            queue_type,
            ..Self::default()
        }
    }

    pub fn with_max_priority(mut self, max_priority: i32) -> Self {
        self.max_priority = max_priority;
        self
    }

    pub fn with_delay_seconds(mut self, delay_seconds: u32) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=Self::PRIORITY_LIMIT).contains(&self.max_priority) {
            return Err(LineUpError::InvalidOptions(format!(
                "max_priority must be within 0..={}, got {}",
                Self::PRIORITY_LIMIT,
                self.max_priority
            )));
        }
        if self.max_message_size == 0 {
            return Err(LineUpError::InvalidOptions(
                "max_message_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            queue_type: QueueType::default(),
            delay_seconds: 0,
            max_priority: Self::DEFAULT_MAX_PRIORITY,
            max_message_size: Self::DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

// ============== Reporting ==============

/// Point-in-time counters of a single queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub num_messages: usize,
    pub total_added: u64,
    pub total_merged: u64,
    pub total_rejected: u64,
    pub total_delivered: u64,
    pub total_deleted: u64,
    pub total_clears: u64,
}

/// Queue descriptor returned on creation. Carries the security code, so it
/// is only handed to the creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueInfo {
    pub name: String,
    pub security_code: String,
    pub queue_type: QueueType,
    pub options: QueueOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(
            "allowduplicates".parse::<QueueType>().unwrap(),
            QueueType::AllowDuplicates
        );
        assert_eq!(
            "REJECTDUPLICATES".parse::<QueueType>().unwrap(),
            QueueType::RejectDuplicates
        );
        assert_eq!(
            "PriorityWithoutDuplicates".parse::<QueueType>().unwrap(),
            QueueType::PriorityWithoutDuplicates
        );
    }

    #[test]
    fn test_parse_legacy_priority_queue() {
        assert_eq!(
            "PriorityQueue".parse::<QueueType>().unwrap(),
            QueueType::PriorityMergingDuplicates
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "fancy".parse::<QueueType>().unwrap_err(),
            LineUpError::UnknownQueueType("fancy".to_string())
        );
    }

    #[test]
    fn test_selector_defaults_when_empty() {
        assert_eq!(QueueType::from_selector(None).unwrap(), QueueType::AllowDuplicates);
        assert_eq!(
            QueueType::from_selector(Some("  ")).unwrap(),
            QueueType::AllowDuplicates
        );
    }

    #[test]
    fn test_display_round_trips() {
        for t in QueueType::ALL {
            assert_eq!(t.to_string().parse::<QueueType>().unwrap(), t);
        }
    }

    #[test]
    fn test_options_validation() {
        assert!(QueueOptions::default().validate().is_ok());
        assert!(QueueOptions::default().with_max_priority(0).validate().is_ok());
        assert!(QueueOptions::default().with_max_priority(-1).validate().is_err());
        assert!(QueueOptions::default()
            .with_max_priority(QueueOptions::PRIORITY_LIMIT + 1)
            .validate()
            .is_err());
        assert!(QueueOptions::default()
            .with_max_message_size(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let opts: QueueOptions =
            serde_json::from_str(r#"{"queueType":"PriorityWithDuplicates"}"#).unwrap();
        assert_eq!(opts.queue_type, QueueType::PriorityWithDuplicates);
        assert_eq!(opts.max_priority, QueueOptions::DEFAULT_MAX_PRIORITY);
        assert_eq!(opts.max_message_size, QueueOptions::DEFAULT_MAX_MESSAGE_SIZE);
        assert_eq!(opts.delay_seconds, 0);
    }
}
