//! The semaphore itself.
//!
//! A [`Semaphore`] is a handle on one validated lock path. It keeps no state
//! beyond the path, its config, and its [`Host`]: every question ("is it
//! locked?", "who holds it?") is answered by reading the file again.

use super::guard::SemaphoreGuard;
use super::host::{Host, SystemHost};
use super::path::validate_lock_path;
use super::record::{LockRecord, sanitize_tag};
use super::status::{CleanReport, LockStatus};
use crate::config::SemaphoreConfig;
use crate::error::{Result, SemaphoreError};
use crate::fs::atomic::{self, Publish};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Suffix of the file that serializes deletion of a stale lock.
const RECLAIM_SUFFIX: &str = "reclaim";

/// A reclaim file older than this whose writer is gone was left by a crash.
pub(crate) const RECLAIM_STALE_MS: u64 = 10_000;

/// Options for blocking acquisition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquireOptions {
    /// Overrides the config's `acquire_timeout` when set.
    pub timeout: Option<Duration>,

    /// Tag written into the lock record.
    pub tag: Option<String>,
}

impl AcquireOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// A file-based cross-process lock bound to a single path.
///
/// Any number of instances, in any number of processes, may point at the same
/// path. Mutual exclusion comes only from the exclusive publish of the lock
/// file, never from in-memory state.
#[derive(Debug, Clone)]
pub struct Semaphore<H: Host = SystemHost> {
    path: PathBuf,
    config: SemaphoreConfig,
    host: H,
}

impl Semaphore<SystemHost> {
    /// Create a semaphore for the current process.
    ///
    /// # Errors
    ///
    /// * `InvalidPath` / `PathTraversal` - the path fails validation
    /// * `InvalidConfig` - the config fails validation
    pub fn new(path: impl AsRef<Path>, config: SemaphoreConfig) -> Result<Self> {
        Self::with_host(path, config, SystemHost::current())
    }

    /// Create a semaphore with [`SemaphoreConfig::default`].
    pub fn with_defaults(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(path, SemaphoreConfig::default())
    }
}

impl<H: Host> Semaphore<H> {
    /// Create a semaphore that takes its pid, clock, and liveness probe from `host`.
    pub fn with_host(path: impl AsRef<Path>, config: SemaphoreConfig, host: H) -> Result<Self> {
        config.validate()?;
        let path = validate_lock_path(path)?;

        tracing::debug!(path = %path.display(), "semaphore bound");
        Ok(Self { path, config, host })
    }

    /// The validated, absolute, symlink-resolved lock path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &SemaphoreConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Whether a lock file exists, valid or not.
    pub fn is_locked(&self) -> bool {
        fs::symlink_metadata(&self.path).is_ok()
    }

    /// The current record, or `None` if the file is missing or unparseable.
    pub fn lock_info(&self) -> Option<LockRecord> {
        self.read_record().ok().flatten()
    }

    /// Read the current record.
    ///
    /// Returns `Ok(None)` when no lock file exists and `Err(Parse)` when one
    /// exists but is corrupt.
    pub fn read_record(&self) -> Result<Option<LockRecord>> {
        match self.read_raw()? {
            Some(content) => Ok(Some(LockRecord::parse(&content)?)),
            None => Ok(None),
        }
    }

    /// Attempt to take the lock once, without waiting.
    ///
    /// A stale lock whose holder is no longer running is removed first. The
    /// new record is then published atomically; if any other file is in place
    /// by that point the attempt fails with `AlreadyLocked`.
    pub fn try_acquire(&self, tag: Option<&str>) -> Result<LockRecord> {
        self.reclaim_if_stale();

        let pid = self.host.current_pid();
        let max_tag_length = self.config.max_tag_length;
        let record = LockRecord::new(
            pid,
            self.host.now_seconds(),
            tag.map(|t| sanitize_tag(t, max_tag_length)),
        );
        let content = record.serialize(max_tag_length);

        let temp = atomic::write_temp(self.temp_path()?, content.as_bytes())?;
        match atomic::publish_exclusive(&temp, &self.path, content.as_bytes())? {
            Publish::Created => {
                tracing::debug!(path = %self.path.display(), pid, "lock acquired");
                Ok(record)
            }
            Publish::AlreadyExists => Err(self.already_locked()),
        }
    }

    /// Take the lock, polling until it is free or the timeout runs out.
    ///
    /// `options.timeout` falls back to the config's `acquire_timeout`; with
    /// neither set this waits indefinitely. A zero timeout makes exactly one
    /// attempt. Errors other than `AlreadyLocked` end the wait immediately.
    pub fn acquire(&self, options: AcquireOptions) -> Result<LockRecord> {
        let timeout = options.timeout.or_else(|| self.config.acquire_timeout());
        let start = Instant::now();

        loop {
            match self.try_acquire(options.tag.as_deref()) {
                Err(SemaphoreError::AlreadyLocked { holder_pid, .. }) => {
                    let pause = self.next_pause(start, timeout, holder_pid)?;
                    thread::sleep(pause);
                }
                result => return result,
            }
        }
    }

    /// Async variant of [`acquire`](Self::acquire). Dropping the future
    /// cancels the wait; each attempt runs to completion before yielding.
    #[cfg(feature = "async")]
    pub async fn acquire_async(&self, options: AcquireOptions) -> Result<LockRecord> {
        let timeout = options.timeout.or_else(|| self.config.acquire_timeout());
        let start = Instant::now();

        loop {
            match self.try_acquire(options.tag.as_deref()) {
                Err(SemaphoreError::AlreadyLocked { holder_pid, .. }) => {
                    let pause = self.next_pause(start, timeout, holder_pid)?;
                    tokio::time::sleep(pause).await;
                }
                result => return result,
            }
        }
    }

    /// Like [`try_acquire`](Self::try_acquire), but releases on drop.
    pub fn try_acquire_guard(&self, tag: Option<&str>) -> Result<SemaphoreGuard<'_, H>> {
        let record = self.try_acquire(tag)?;
        Ok(SemaphoreGuard::new(self, record))
    }

    /// Like [`acquire`](Self::acquire), but releases on drop.
    pub fn acquire_guard(&self, options: AcquireOptions) -> Result<SemaphoreGuard<'_, H>> {
        let record = self.acquire(options)?;
        Ok(SemaphoreGuard::new(self, record))
    }

    /// Remove the lock file.
    ///
    /// Without `force`, a valid record must name the caller's pid. A corrupt
    /// file is owned by nobody and is always removable. With `force` the
    /// ownership check is skipped entirely, which gives up mutual exclusion
    /// for whoever currently holds the lock.
    pub fn release(&self, force: bool) -> Result<()> {
        let Some(content) = self.read_raw()? else {
            return Err(SemaphoreError::NotLocked);
        };

        if !force
            && let Ok(record) = LockRecord::parse(&content)
            && record.pid != self.host.current_pid()
        {
            return Err(SemaphoreError::PermissionDenied {
                holder_pid: record.pid,
            });
        }

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), force, "lock released");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SemaphoreError::NotLocked),
            Err(e) => Err(SemaphoreError::io(&self.path, e)),
        }
    }

    /// Describe the lock without changing anything.
    pub fn status(&self) -> LockStatus {
        let content = match self.read_raw() {
            Ok(Some(content)) => content,
            Ok(None) => return LockStatus::unlocked(),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "lock file unreadable");
                return LockStatus::corrupt();
            }
        };

        let Ok(record) = LockRecord::parse(&content) else {
            return LockStatus::corrupt();
        };

        let now = self.host.now_seconds();
        LockStatus {
            locked: true,
            is_stale: self
                .config
                .stale_timeout_ms
                .is_some_and(|timeout_ms| record.is_stale_at(timeout_ms, now)),
            is_owned_by_caller: record.pid == self.host.current_pid(),
            holder_running: Some(self.host.is_process_running(record.pid)),
            record: Some(record),
        }
    }

    /// Remove a stale lock and any orphaned temp files.
    ///
    /// Returns true if anything was removed.
    pub fn clean_stale(&self) -> Result<bool> {
        Ok(self.clean_stale_report()?.removed_any())
    }

    /// [`clean_stale`](Self::clean_stale) with a breakdown of what went.
    ///
    /// The lock file is removed only if it parses, is older than the stale
    /// timeout, and its holder is not running. A corrupt file is left alone.
    /// Temp files are removed when the pid in their name is not running, and
    /// an abandoned reclaim file counts as one of them.
    pub fn clean_stale_report(&self) -> Result<CleanReport> {
        let mut report = CleanReport::default();

        if let Some(timeout_ms) = self.config.stale_timeout_ms
            && let Some(content) = self.read_raw()?
            && let Ok(record) = LockRecord::parse(&content)
            && self.is_reclaimable(&record, timeout_ms)
        {
            report.lock_removed = self.remove_stale(&content, &record)?;
        }

        if self.clear_abandoned_reclaim()? {
            report.temp_files_removed += 1;
        }
        report.temp_files_removed += self.remove_orphaned_temp_files()?;
        Ok(report)
    }

    /// Poll until no lock file exists.
    ///
    /// Nothing is acquired; the lock may be taken again before the caller acts.
    pub fn wait_until_free(&self, timeout: Option<Duration>) -> Result<()> {
        let start = Instant::now();

        while self.is_locked() {
            let holder_pid = self.lock_info().map(|r| r.pid);
            let pause = self.next_pause(start, timeout, holder_pid)?;
            thread::sleep(pause);
        }
        Ok(())
    }

    fn read_raw(&self) -> Result<Option<String>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SemaphoreError::io(&self.path, e)),
        }
    }

    fn is_reclaimable(&self, record: &LockRecord, timeout_ms: u64) -> bool {
        record.is_stale_at(timeout_ms, self.host.now_seconds())
            && !self.host.is_process_running(record.pid)
    }

    /// Remove the lock file if it is stale and abandoned. Failures are ignored;
    /// the exclusive publish that follows decides the outcome either way.
    fn reclaim_if_stale(&self) {
        let Some(timeout_ms) = self.config.stale_timeout_ms else {
            return;
        };
        let Ok(Some(content)) = self.read_raw() else {
            return;
        };
        let Ok(record) = LockRecord::parse(&content) else {
            return;
        };
        if !self.is_reclaimable(&record, timeout_ms) {
            return;
        }

        match self.remove_stale(&content, &record) {
            Ok(true) => tracing::debug!(
                path = %self.path.display(),
                pid = record.pid,
                timestamp = record.timestamp,
                "reclaimed stale lock"
            ),
            Ok(false) => {}
            Err(e) => tracing::debug!(
                path = %self.path.display(),
                error = %e,
                "could not remove stale lock"
            ),
        }
    }

    /// Delete the lock file if it still holds `stale`.
    ///
    /// Runs under the reclaim file so that only one caller at a time can delete
    /// a stale lock. A stale file only turns into a fresh one by being deleted,
    /// so a matching re-read under the reclaim file cannot be a fresh lock.
    /// Returns false if another caller is reclaiming or the file moved on.
    pub(super) fn remove_stale(&self, stale: &str, record: &LockRecord) -> Result<bool> {
        let Some(_reclaim) = self.take_reclaim()? else {
            tracing::trace!(path = %self.path.display(), "stale lock is being reclaimed elsewhere");
            return Ok(false);
        };

        if self.read_raw()?.as_deref() != Some(stale) {
            return Ok(false);
        }

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), pid = record.pid, "removed stale lock");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SemaphoreError::io(&self.path, e)),
        }
    }

    fn reclaim_path(&self) -> Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SemaphoreError::InvalidPath("invalid lock file name".to_string()))?;
        Ok(self
            .path
            .with_file_name(format!("{}.{}", file_name, RECLAIM_SUFFIX)))
    }

    /// Take the reclaim file, clearing one left behind by a crash first.
    fn take_reclaim(&self) -> Result<Option<atomic::TempFile>> {
        let path = self.reclaim_path()?;
        let pid = self.host.process_id();
        let content = LockRecord::new(pid, self.host.now_seconds(), None).serialize(0);

        if let Some(owned) = atomic::create_owned(&path, pid, content.as_bytes())? {
            return Ok(Some(owned));
        }
        if !self.clear_abandoned_reclaim()? {
            return Ok(None);
        }
        atomic::create_owned(&path, pid, content.as_bytes())
    }

    /// Remove the reclaim file if its writer died more than
    /// [`RECLAIM_STALE_MS`] ago. An unparseable one is left alone.
    fn clear_abandoned_reclaim(&self) -> Result<bool> {
        let path = self.reclaim_path()?;
        let content = match fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(SemaphoreError::io(&path, e)),
        };
        let Ok(record) = LockRecord::parse(&content) else {
            return Ok(false);
        };
        if !self.is_reclaimable(&record, RECLAIM_STALE_MS) {
            return Ok(false);
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), pid = record.pid, "removed abandoned reclaim file");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SemaphoreError::io(&path, e)),
        }
    }

    /// Temp file name for the next publish, named after the writing process.
    pub(crate) fn temp_path(&self) -> Result<PathBuf> {
        atomic::temp_path_for(&self.path, self.host.process_id())
    }

    fn already_locked(&self) -> SemaphoreError {
        let holder = self.lock_info();
        SemaphoreError::AlreadyLocked {
            holder_pid: holder.as_ref().map(|r| r.pid),
            locked_since: holder.as_ref().map(|r| r.timestamp),
        }
    }

    /// How long to sleep before the next poll, or `Timeout` if time is up.
    fn next_pause(
        &self,
        start: Instant,
        timeout: Option<Duration>,
        holder_pid: Option<u32>,
    ) -> Result<Duration> {
        let interval = self.config.retry_interval();
        let Some(timeout) = timeout else {
            return Ok(interval);
        };

        let waited = start.elapsed();
        if waited >= timeout {
            tracing::debug!(path = %self.path.display(), ?holder_pid, "gave up waiting for lock");
            return Err(SemaphoreError::Timeout { waited, holder_pid });
        }

        tracing::trace!(path = %self.path.display(), ?holder_pid, "lock busy, polling");
        Ok(interval.min(timeout - waited))
    }

    fn remove_orphaned_temp_files(&self) -> Result<usize> {
        let (Some(dir), Some(lock_name)) = (
            self.path.parent(),
            self.path.file_name().and_then(|n| n.to_str()),
        ) else {
            return Ok(0);
        };

        let reclaim_name = format!("{}.{}", lock_name, RECLAIM_SUFFIX);
        let entries = fs::read_dir(dir).map_err(|e| SemaphoreError::io(dir, e))?;
        let mut removed = 0;

        for entry in entries {
            let entry = entry.map_err(|e| SemaphoreError::io(dir, e))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(pid) = atomic::temp_file_owner(lock_name, name)
                .or_else(|| atomic::temp_file_owner(&reclaim_name, name))
            else {
                continue;
            };
            if self.host.is_process_running(pid) {
                continue;
            }

            let path = entry.path();
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), pid, "removed orphaned temp file");
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(SemaphoreError::io(&path, e)),
            }
        }

        Ok(removed)
    }
}
