//! RAII lock guard implementation.

use super::host::Host;
use super::record::LockRecord;
use super::semaphore::Semaphore;
use crate::error::Result;
use std::path::Path;

/// RAII guard for a held lock.
///
/// When dropped, the lock is released as its owner. If that fails, a warning
/// is logged but no panic occurs.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct SemaphoreGuard<'a, H: Host> {
    semaphore: &'a Semaphore<H>,
    record: LockRecord,

    /// Whether the lock has been released manually.
    released: bool,
}

impl<'a, H: Host> SemaphoreGuard<'a, H> {
    pub(super) fn new(semaphore: &'a Semaphore<H>, record: LockRecord) -> Self {
        Self {
            semaphore,
            record,
            released: false,
        }
    }

    /// The record written when the lock was taken.
    pub fn record(&self) -> &LockRecord {
        &self.record
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        self.semaphore.path()
    }

    /// Manually release the lock.
    ///
    /// Useful when the caller wants to handle the error instead of having it
    /// logged on drop.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.semaphore.release(false)
    }
}

impl<H: Host> Drop for SemaphoreGuard<'_, H> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.semaphore.release(false)
        {
            tracing::warn!(
                path = %self.semaphore.path().display(),
                error = %e,
                "failed to release lock"
            );
        }
    }
}
