//! SemaphoreConfig struct definition and default implementation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default staleness threshold: one hour.
pub const DEFAULT_STALE_TIMEOUT_MS: u64 = 3_600_000;

/// Default poll interval for blocking acquisition.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 100;

/// Default cap on persisted tag length, in characters.
pub const DEFAULT_MAX_TAG_LENGTH: usize = 10_000;

/// Configuration for semaphore behavior.
///
/// Immutable once handed to a [`Semaphore`](crate::Semaphore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemaphoreConfig {
    /// Age in milliseconds after which a lock whose holder is dead may be
    /// reclaimed. `None` disables staleness checks entirely.
    #[serde(default = "default_stale_timeout_ms")]
    pub stale_timeout_ms: Option<u64>,

    /// Poll interval for blocking acquisition.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Cap on blocking acquisition. `None` waits indefinitely.
    #[serde(default)]
    pub acquire_timeout_ms: Option<u64>,

    /// Maximum number of tag characters written to the lock file.
    #[serde(default = "default_max_tag_length")]
    pub max_tag_length: usize,
}

impl SemaphoreConfig {
    /// Staleness threshold as a `Duration`.
    pub fn stale_timeout(&self) -> Option<Duration> {
        self.stale_timeout_ms.map(Duration::from_millis)
    }

    /// Poll interval as a `Duration`.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Acquire timeout as a `Duration`.
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self {
            stale_timeout_ms: default_stale_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            acquire_timeout_ms: None,
            max_tag_length: default_max_tag_length(),
        }
    }
}

fn default_stale_timeout_ms() -> Option<u64> {
    Some(DEFAULT_STALE_TIMEOUT_MS)
}

fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL_MS
}

fn default_max_tag_length() -> usize {
    DEFAULT_MAX_TAG_LENGTH
}
