//! File-based cross-process semaphore.
//!
//! Independent processes coordinate exclusive access to a resource through a
//! single lock file. The filesystem is the only shared state: no daemon, no
//! socket, no shared memory.
//!
//! ```no_run
//! use file_semaphore::{AcquireOptions, Semaphore};
//! use std::time::Duration;
//!
//! # fn main() -> file_semaphore::Result<()> {
//! let semaphore = Semaphore::with_defaults("/tmp/nightly-build.lock")?;
//!
//! let guard = semaphore.acquire_guard(
//!     AcquireOptions::default()
//!         .with_timeout(Duration::from_secs(30))
//!         .with_tag("nightly build"),
//! )?;
//! // ... exclusive work ...
//! guard.release()?;
//! # Ok(())
//! # }
//! ```
//!
//! The lock file is plain text (`pid=`, `timestamp=`, optional `tag=` lines) so
//! it can be inspected by hand or written by other implementations.

pub mod config;
pub mod error;
pub mod exit_codes;
pub(crate) mod fs;
pub mod lock;

pub use config::SemaphoreConfig;
pub use error::{ErrorKind, Result, SemaphoreError};
pub use lock::{
    AcquireOptions, CleanReport, Host, LockRecord, LockState, LockStatus, ParseError, Semaphore,
    SemaphoreGuard, SystemHost, is_process_running, sanitize_tag, validate_lock_path,
};
