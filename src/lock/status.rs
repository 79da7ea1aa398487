//! Read-only views of a lock path.

use super::record::LockRecord;
use serde::Serialize;

/// Snapshot of a lock path at one instant.
///
/// Produced by [`Semaphore::status`](super::Semaphore::status). The file may
/// change the moment after it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockStatus {
    /// A lock file exists, parseable or not.
    pub locked: bool,

    /// The parsed record, if the file exists and is valid.
    pub record: Option<LockRecord>,

    /// The record is older than the stale timeout. Always false when staleness
    /// is disabled or there is no record.
    pub is_stale: bool,

    /// The record's pid is the caller's pid.
    pub is_owned_by_caller: bool,

    /// Liveness of the recorded pid, when a record exists.
    pub holder_running: Option<bool>,
}

/// Coarse classification of a [`LockStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Unlocked,
    OwnedByCaller,
    OwnedByOther,
    /// A file exists but does not parse. Nobody owns it.
    Corrupt,
}

impl LockStatus {
    pub(crate) fn unlocked() -> Self {
        Self {
            locked: false,
            record: None,
            is_stale: false,
            is_owned_by_caller: false,
            holder_running: None,
        }
    }

    pub(crate) fn corrupt() -> Self {
        Self {
            locked: true,
            ..Self::unlocked()
        }
    }

    pub fn state(&self) -> LockState {
        match (&self.record, self.locked) {
            (_, false) => LockState::Unlocked,
            (None, true) => LockState::Corrupt,
            (Some(_), true) if self.is_owned_by_caller => LockState::OwnedByCaller,
            (Some(_), true) => LockState::OwnedByOther,
        }
    }

    /// The recorded holder is stale and no longer running, so the lock would
    /// be reclaimed by the next acquisition attempt.
    pub fn is_reclaimable(&self) -> bool {
        self.is_stale && self.holder_running == Some(false)
    }
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LockState::Unlocked => "unlocked",
            LockState::OwnedByCaller => "owned by caller",
            LockState::OwnedByOther => "owned by another process",
            LockState::Corrupt => "corrupt",
        };
        f.write_str(s)
    }
}

/// What [`Semaphore::clean_stale_report`](super::Semaphore::clean_stale_report) removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    /// The stale lock file itself was removed.
    pub lock_removed: bool,

    /// Number of orphaned temp files removed.
    pub temp_files_removed: usize,
}

impl CleanReport {
    /// Whether anything was removed.
    pub fn removed_any(&self) -> bool {
        self.lock_removed || self.temp_files_removed > 0
    }
}
