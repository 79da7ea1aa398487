//! Process-global services the semaphore depends on.
//!
//! The caller's PID, the wall clock, and the liveness probe are all ambient
//! state. Routing them through [`Host`] lets tests play the part of other
//! processes and move time forward without sleeping.

use super::process;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of identity, time, and liveness for a [`Semaphore`](super::Semaphore).
pub trait Host {
    /// PID written into records this caller creates, and compared for ownership.
    fn current_pid(&self) -> u32;

    /// Current Unix time in whole seconds.
    fn now_seconds(&self) -> u64;

    /// Whether `pid` is still alive.
    fn is_process_running(&self, pid: u32) -> bool;

    /// PID of the process doing the file work.
    ///
    /// Differs from [`current_pid`](Self::current_pid) when acting on behalf of
    /// another process. Temp and reclaim files are named after this one, so
    /// they count as orphaned as soon as the writer dies.
    fn process_id(&self) -> u32 {
        std::process::id()
    }
}

/// The real operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemHost {
    pid: u32,
}

impl SystemHost {
    /// Host identity for the current process.
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
        }
    }

    /// Act on behalf of another process, e.g. a CLI recording its parent shell
    /// as the holder.
    pub fn for_pid(pid: u32) -> Self {
        Self { pid }
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::current()
    }
}

impl Host for SystemHost {
    fn current_pid(&self) -> u32 {
        self.pid
    }

    fn now_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn is_process_running(&self, pid: u32) -> bool {
        process::is_process_running(pid)
    }
}

impl<H: Host + ?Sized> Host for &H {
    fn current_pid(&self) -> u32 {
        (**self).current_pid()
    }

    fn now_seconds(&self) -> u64 {
        (**self).now_seconds()
    }

    fn is_process_running(&self, pid: u32) -> bool {
        (**self).is_process_running(pid)
    }

    fn process_id(&self) -> u32 {
        (**self).process_id()
    }
}
