//! Lock path validation.
//!
//! A caller-supplied path is checked for traversal tricks on the raw input,
//! before anything normalizes it away, and only then resolved against the
//! filesystem. The result is an absolute path with every symlink resolved, so
//! the semaphore never operates through an indirection that could be swapped
//! underneath it.
//!
//! The `..` check rejects the substring anywhere, not just as a path segment.
//! This also rejects legitimate names such as `my..file.lock`.

use crate::error::{Result, SemaphoreError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Upper bound on symlink hops, matching the usual kernel `MAXSYMLINKS`.
const MAX_SYMLINK_HOPS: usize = 40;

/// Validate and resolve a lock file path.
///
/// Rules, in order:
/// 1. empty or all-whitespace input is `InvalidPath`
/// 2. a NUL byte is `PathTraversal`
/// 3. the substring `..` is `PathTraversal`
/// 4. the path is made absolute
/// 5. an existing entry is resolved through its symlink chain, dangling links included
/// 6. the parent directory of the result must already exist
pub fn validate_lock_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let raw = path.as_ref();
    check_raw(raw)?;

    let absolute = std::path::absolute(raw).map_err(|e| {
        SemaphoreError::InvalidPath(format!(
            "cannot resolve '{}' to an absolute path: {}",
            raw.display(),
            e
        ))
    })?;

    let resolved = resolve_symlinks(&absolute)?;
    check_parent(&resolved)?;
    Ok(resolved)
}

/// Checks that run on the unnormalized input and touch no filesystem state.
fn check_raw(raw: &Path) -> Result<()> {
    let bytes = raw.as_os_str().as_encoded_bytes();

    if raw.to_string_lossy().trim().is_empty() {
        return Err(SemaphoreError::InvalidPath(
            "path cannot be empty".to_string(),
        ));
    }

    if bytes.contains(&0) {
        return Err(SemaphoreError::PathTraversal(
            "path contains a NUL byte".to_string(),
        ));
    }

    if bytes.windows(2).any(|w| w == b"..") {
        return Err(SemaphoreError::PathTraversal(format!(
            "path contains '..': {}",
            raw.display()
        )));
    }

    Ok(())
}

/// Resolve `path` to its concrete target.
///
/// - nothing at `path`: the parent is canonicalized and the file name kept
/// - a regular entry: canonicalized directly
/// - a symlink: followed hop by hop; a dangling final target resolves to its
///   canonical parent joined with the missing file name
fn resolve_symlinks(path: &Path) -> Result<PathBuf> {
    let mut current = path.to_path_buf();

    for _ in 0..MAX_SYMLINK_HOPS {
        let meta = match fs::symlink_metadata(&current) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return canonicalize_missing(&current);
            }
            Err(e) => return Err(SemaphoreError::io(&current, e)),
        };

        if !meta.file_type().is_symlink() {
            let canonical =
                fs::canonicalize(&current).map_err(|e| SemaphoreError::io(&current, e))?;
            if canonical.is_dir() {
                return Err(SemaphoreError::InvalidPath(format!(
                    "lock path is a directory: {}",
                    canonical.display()
                )));
            }
            return Ok(canonical);
        }

        let target = fs::read_link(&current).map_err(|e| SemaphoreError::io(&current, e))?;
        current = if target.is_absolute() {
            target
        } else {
            current
                .parent()
                .map(|parent| parent.join(&target))
                .unwrap_or(target)
        };
    }

    Err(SemaphoreError::InvalidPath(format!(
        "too many levels of symbolic links: {}",
        path.display()
    )))
}

/// Resolve a path whose final component does not exist.
fn canonicalize_missing(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        SemaphoreError::InvalidPath(format!("path has no file name: {}", path.display()))
    })?;
    let parent = path.parent().ok_or_else(|| {
        SemaphoreError::InvalidPath(format!("path has no parent: {}", path.display()))
    })?;

    match fs::canonicalize(parent) {
        Ok(parent) => Ok(parent.join(file_name)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(missing_parent(parent)),
        Err(e) => Err(SemaphoreError::io(parent, e)),
    }
}

fn check_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if parent.is_dir() => Ok(()),
        Some(parent) => Err(missing_parent(parent)),
        None => Err(SemaphoreError::InvalidPath(format!(
            "path has no parent: {}",
            path.display()
        ))),
    }
}

fn missing_parent(parent: &Path) -> SemaphoreError {
    SemaphoreError::InvalidPath(format!(
        "parent directory does not exist: {}",
        parent.display()
    ))
}
