//! Atomic create-if-absent publishing of lock files.
//!
//! A lock file must never be observable half-written, and it must never replace
//! an existing lock. Both properties come from one pattern:
//!
//! 1. Write the full content to a uniquely named temporary file in the same directory
//! 2. Sync it to disk (fsync)
//! 3. Hard-link it to the target name, which fails with `AlreadyExists` when the
//!    target is present
//! 4. Remove the temporary name
//!
//! `rename()` cannot be used for step 3: on POSIX it silently replaces the
//! destination. When the filesystem has no hard links (FAT, some network
//! mounts), publishing falls back to `create_new` on the target, which is still
//! exclusive but briefly exposes an empty file.
//!
//! Temporary files are named `<lockfile>.<pid>.<16 hex digits>.tmp`. The suffix
//! comes from the thread-local CSPRNG so a co-located process cannot predict it.

use crate::error::{Result, SemaphoreError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Outcome of [`publish_exclusive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Publish {
    /// The target did not exist and now holds the new content.
    Created,
    /// The target already existed and was left untouched.
    AlreadyExists,
}

/// A temporary file that is deleted when dropped.
#[derive(Debug)]
pub(crate) struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temp file");
        }
    }
}

/// Build the temporary path for a lock file owned by `pid`.
pub(crate) fn temp_path_for(target: &Path, pid: u32) -> Result<PathBuf> {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SemaphoreError::InvalidPath("invalid lock file name".to_string()))?;

    let suffix: u64 = rand::random();
    Ok(target.with_file_name(format!("{}.{}.{:016x}.tmp", file_name, pid, suffix)))
}

/// If `candidate` is a temporary file for `lock_file_name`, return the PID
/// embedded in its name.
pub(crate) fn temp_file_owner(lock_file_name: &str, candidate: &str) -> Option<u32> {
    let rest = candidate
        .strip_prefix(lock_file_name)?
        .strip_prefix('.')?
        .strip_suffix(".tmp")?;
    let (pid, suffix) = rest.split_once('.')?;

    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    pid.parse().ok()
}

/// Write `content` to a fresh file at `path` and sync it.
///
/// The file is created exclusively with owner-only permissions. It is removed
/// again if any step fails.
pub(crate) fn write_temp(path: PathBuf, content: &[u8]) -> Result<TempFile> {
    let mut file = create_owner_only(&path).map_err(|e| SemaphoreError::io(&path, e))?;
    let temp = TempFile { path };

    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| SemaphoreError::io(temp.path(), e))?;

    Ok(temp)
}

/// Publish `temp` at `target` unless `target` already exists.
///
/// `content` must be what `temp` holds; it is used only by the fallback path.
pub(crate) fn publish_exclusive(temp: &TempFile, target: &Path, content: &[u8]) -> Result<Publish> {
    match fs::hard_link(temp.path(), target) {
        Ok(()) => {
            sync_parent(target);
            Ok(Publish::Created)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(Publish::AlreadyExists),
        Err(e) if hard_links_unsupported(&e) => {
            tracing::debug!(
                target = %target.display(),
                error = %e,
                "hard links unavailable, falling back to exclusive create"
            );
            create_exclusive(target, content)
        }
        Err(e) => Err(SemaphoreError::io(target, e)),
    }
}

/// Publish `content` at `target` unless it exists, on behalf of `pid`.
///
/// On success the returned handle owns `target` and removes it when dropped.
/// Returns `None` if `target` was already present.
pub(crate) fn create_owned(target: &Path, pid: u32, content: &[u8]) -> Result<Option<TempFile>> {
    let temp = write_temp(temp_path_for(target, pid)?, content)?;
    match publish_exclusive(&temp, target, content)? {
        Publish::Created => Ok(Some(TempFile {
            path: target.to_path_buf(),
        })),
        Publish::AlreadyExists => Ok(None),
    }
}

/// Exclusive-create fallback for filesystems without hard links.
fn create_exclusive(target: &Path, content: &[u8]) -> Result<Publish> {
    let mut file = match create_owner_only(target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(Publish::AlreadyExists),
        Err(e) => return Err(SemaphoreError::io(target, e)),
    };

    if let Err(e) = file.write_all(content).and_then(|()| file.sync_all()) {
        // Never leave a half-written lock behind
        let _ = fs::remove_file(target);
        return Err(SemaphoreError::io(target, e));
    }

    sync_parent(target);
    Ok(Publish::Created)
}

fn create_owner_only(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

fn hard_links_unsupported(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::Unsupported {
        return true;
    }

    #[cfg(unix)]
    {
        matches!(
            err.raw_os_error(),
            Some(code) if code == libc::EPERM || code == libc::EOPNOTSUPP || code == libc::ENOSYS
        )
    }

    #[cfg(windows)]
    {
        // ERROR_INVALID_FUNCTION / ERROR_NOT_SUPPORTED
        matches!(err.raw_os_error(), Some(1) | Some(50))
    }

    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}

/// Persist the new directory entry. Best effort.
fn sync_parent(target: &Path) {
    #[cfg(unix)]
    {
        if let Some(parent) = target.parent()
            && let Ok(dir) = File::open(parent)
        {
            let _ = dir.sync_all();
        }
    }

    #[cfg(not(unix))]
    {
        let _ = target;
    }
}
