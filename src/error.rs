//! Error types for file-semaphore.
//!
//! Uses thiserror for derive macros. Every variant carries the structured data a
//! caller needs to decide whether to wait, force, or abort (holder pid, field
//! names, the path involved), so callers never have to parse messages.

use crate::exit_codes;
use crate::lock::ParseError;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for semaphore operations.
#[derive(Error, Debug)]
pub enum SemaphoreError {
    /// The lock path is empty, has no usable parent, or points at a directory.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The lock path contains `..` or a NUL byte.
    #[error("Path traversal rejected: {0}")]
    PathTraversal(String),

    /// The lock file already exists.
    ///
    /// Holder fields are `None` when the existing file could not be parsed.
    #[error("Lock already held{}{}", fmt_holder(.holder_pid), fmt_since(.locked_since))]
    AlreadyLocked {
        holder_pid: Option<u32>,
        locked_since: Option<u64>,
    },

    /// Release was requested but no lock file exists.
    #[error("Lock not held")]
    NotLocked,

    /// Release was requested for a lock owned by another process.
    #[error("Lock is owned by PID {holder_pid}; use force to remove it anyway")]
    PermissionDenied { holder_pid: u32 },

    /// Blocking acquisition gave up.
    #[error("Timeout waiting for lock after {}ms{}", .waited.as_millis(), fmt_holder(.holder_pid))]
    Timeout {
        waited: Duration,
        holder_pid: Option<u32>,
    },

    /// The lock file exists but its content is not a valid record.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Filesystem error, with the path it happened on.
    #[error("IO error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration values are out of range or unreadable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Stable, language-neutral error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidPath,
    PathTraversal,
    AlreadyLocked,
    NotLocked,
    PermissionDenied,
    Timeout,
    ParseError,
    IoError,
    InvalidConfig,
}

impl ErrorKind {
    /// The wire name of this kind (e.g. `ALREADY_LOCKED`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidPath => "INVALID_PATH",
            ErrorKind::PathTraversal => "PATH_TRAVERSAL",
            ErrorKind::AlreadyLocked => "ALREADY_LOCKED",
            ErrorKind::NotLocked => "NOT_LOCKED",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ParseError => "PARSE_ERROR",
            ErrorKind::IoError => "IO_ERROR",
            ErrorKind::InvalidConfig => "INVALID_CONFIG",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SemaphoreError {
    /// Build an `Io` error for `path`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SemaphoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the stable kind code for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SemaphoreError::InvalidPath(_) => ErrorKind::InvalidPath,
            SemaphoreError::PathTraversal(_) => ErrorKind::PathTraversal,
            SemaphoreError::AlreadyLocked { .. } => ErrorKind::AlreadyLocked,
            SemaphoreError::NotLocked => ErrorKind::NotLocked,
            SemaphoreError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            SemaphoreError::Timeout { .. } => ErrorKind::Timeout,
            SemaphoreError::Parse(_) => ErrorKind::ParseError,
            SemaphoreError::Io { .. } => ErrorKind::IoError,
            SemaphoreError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// PID of the current lock holder, when the error knows it.
    pub fn holder_pid(&self) -> Option<u32> {
        match self {
            SemaphoreError::AlreadyLocked { holder_pid, .. } => *holder_pid,
            SemaphoreError::Timeout { holder_pid, .. } => *holder_pid,
            SemaphoreError::PermissionDenied { holder_pid } => Some(*holder_pid),
            _ => None,
        }
    }

    /// Returns the appropriate CLI exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SemaphoreError::AlreadyLocked { .. }
            | SemaphoreError::NotLocked
            | SemaphoreError::PermissionDenied { .. }
            | SemaphoreError::Timeout { .. } => exit_codes::LOCK_HELD,
            SemaphoreError::InvalidPath(_)
            | SemaphoreError::PathTraversal(_)
            | SemaphoreError::InvalidConfig(_) => exit_codes::USAGE_ERROR,
            SemaphoreError::Parse(_) | SemaphoreError::Io { .. } => exit_codes::IO_ERROR,
        }
    }
}

fn fmt_holder(pid: &Option<u32>) -> String {
    pid.map(|p| format!(" by PID {}", p)).unwrap_or_default()
}

fn fmt_since(since: &Option<u64>) -> String {
    since.map(|s| format!(" since {}", s)).unwrap_or_default()
}

/// Result type alias for semaphore operations.
pub type Result<T> = std::result::Result<T, SemaphoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_contention_errors_share_exit_code() {
        let errors = [
            SemaphoreError::AlreadyLocked {
                holder_pid: Some(1),
                locked_since: None,
            },
            SemaphoreError::NotLocked,
            SemaphoreError::PermissionDenied { holder_pid: 7 },
            SemaphoreError::Timeout {
                waited: Duration::from_millis(5),
                holder_pid: None,
            },
        ];
        for err in &errors {
            assert_eq!(err.exit_code(), exit_codes::LOCK_HELD, "{err}");
        }
    }

    #[test]
    fn path_errors_are_usage_errors() {
        let err = SemaphoreError::PathTraversal("../x".to_string());
        assert_eq!(err.exit_code(), exit_codes::USAGE_ERROR);
        assert_eq!(err.kind(), ErrorKind::PathTraversal);

        let err = SemaphoreError::InvalidPath("empty".to_string());
        assert_eq!(err.exit_code(), exit_codes::USAGE_ERROR);
    }

    #[test]
    fn io_error_has_correct_exit_code() {
        let err = SemaphoreError::io("/tmp/x.lock", io::Error::other("disk on fire"));
        assert_eq!(err.exit_code(), exit_codes::IO_ERROR);
        assert_eq!(err.kind().as_str(), "IO_ERROR");
        assert!(err.to_string().contains("/tmp/x.lock"));
    }

    #[test]
    fn holder_pid_is_exposed() {
        let err = SemaphoreError::PermissionDenied { holder_pid: 42 };
        assert_eq!(err.holder_pid(), Some(42));
        assert_eq!(SemaphoreError::NotLocked.holder_pid(), None);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = SemaphoreError::AlreadyLocked {
            holder_pid: Some(123),
            locked_since: Some(1_700_000_000),
        };
        assert_eq!(
            err.to_string(),
            "Lock already held by PID 123 since 1700000000"
        );

        let err = SemaphoreError::AlreadyLocked {
            holder_pid: None,
            locked_since: None,
        };
        assert_eq!(err.to_string(), "Lock already held");

        let err = SemaphoreError::Parse(ParseError::MissingField("pid"));
        assert_eq!(err.to_string(), "Parse error: missing field 'pid'");
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn error_kind_serializes_to_wire_name() {
        let json = serde_json::to_string(&ErrorKind::PermissionDenied).unwrap();
        assert_eq!(json, "\"PERMISSION_DENIED\"");
        assert_eq!(ErrorKind::Timeout.to_string(), "TIMEOUT");
    }
}
