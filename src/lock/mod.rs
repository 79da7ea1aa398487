//! Locking subsystem.
//!
//! A lock is a small text file. Whoever manages to publish it owns the lock;
//! removing it releases the lock. Publishing is create-if-absent, so with any
//! number of concurrent contenders exactly one wins.
//!
//! # Stale locks
//!
//! A holder that crashes leaves its file behind. Such a file is reclaimed by
//! the next acquisition attempt, or by [`Semaphore::clean_stale`], once it is
//! older than the configured stale timeout *and* its recorded pid is no longer
//! running. A live holder is never reclaimed, however old its lock.
//!
//! Deleting a stale lock is serialized through a `<lock>.reclaim` file taken
//! with an exclusive create. Only its owner deletes, and only after re-reading
//! the lock under it, so a fresh lock published in the meantime is never
//! removed. Contenders that find the reclaim file taken skip straight to
//! publishing. A reclaim file whose writer is gone and which is older than
//! ten seconds was left by a crash and is removed before the next attempt.
//! Two callers clearing the same abandoned reclaim file at once can still
//! both go on to delete, so that case relies on no second crash mid-reclaim.
//!
//! # RAII Guards
//!
//! [`Semaphore::try_acquire_guard`] and [`Semaphore::acquire_guard`] return a
//! [`SemaphoreGuard`] that releases the lock when dropped.

mod guard;
mod host;
mod path;
mod process;
mod record;
mod semaphore;
mod status;


pub use guard::SemaphoreGuard;
pub use host::{Host, SystemHost};
pub use path::validate_lock_path;
pub use process::is_process_running;
pub use record::{LockRecord, ParseError, sanitize_tag};
pub use semaphore::{AcquireOptions, Semaphore};
pub use status::{CleanReport, LockState, LockStatus};
