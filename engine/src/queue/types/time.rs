//! Time utilities and hash type aliases.
//!
//! - GxHash: AES-NI backed hasher for the identity indexes and the directory
//! - Wall-clock timestamp in milliseconds for message creation time

use std::collections::HashSet;
use std::hash::BuildHasherDefault;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use gxhash::GxHasher;

// ============== GxHash Type Aliases ==============

pub type GxBuildHasher = BuildHasherDefault<GxHasher>;
pub type GxHashSet<T> = HashSet<T, GxBuildHasher>;
pub type GxDashMap<K, V> = DashMap<K, V, GxBuildHasher>;

// ============== Timestamp ==============

/// Current wall-clock time in milliseconds since the Unix epoch.
#[inline(always)]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
