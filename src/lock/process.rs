//! Process liveness probe.
//!
//! This is a heuristic, never a security boundary: PIDs are recycled, so a
//! "running" answer may refer to an unrelated process that inherited the id.

/// Check whether a process with the given PID currently exists.
///
/// On Unix this sends the null signal. `EPERM` means the process exists but
/// belongs to someone else, so it counts as running. PIDs that do not map to a
/// single positive `pid_t` (0, or anything above `i32::MAX`) are reported as not
/// running rather than probing a process group.
pub fn is_process_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        let Ok(raw) = libc::pid_t::try_from(pid) else {
            return false;
        };
        if raw <= 0 {
            return false;
        }

        // SAFETY: signal 0 performs only the existence and permission checks.
        let rc = unsafe { libc::kill(raw, 0) };
        if rc == 0 {
            true
        } else {
            matches!(
                std::io::Error::last_os_error().raw_os_error(),
                Some(code) if code == libc::EPERM
            )
        }
    }

    #[cfg(windows)]
    {
        use winapi::um::handleapi::CloseHandle;
        use winapi::um::minwinbase::STILL_ACTIVE;
        use winapi::um::processthreadsapi::{GetExitCodeProcess, OpenProcess};
        use winapi::um::winnt::PROCESS_QUERY_LIMITED_INFORMATION;

        if pid == 0 {
            return false;
        }

        // SAFETY: the handle is checked for null and closed on every path.
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
            if handle.is_null() {
                return false;
            }

            let mut exit_code: u32 = 0;
            let ok = GetExitCodeProcess(handle, &mut exit_code);
            CloseHandle(handle);

            ok != 0 && exit_code == STILL_ACTIVE
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        // No probe available; never treat a holder as dead.
        let _ = pid;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_is_running() {
        assert!(is_process_running(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn pid_zero_is_not_running() {
        assert!(!is_process_running(0));
    }

    #[cfg(unix)]
    #[test]
    fn out_of_range_pids_are_not_running() {
        assert!(!is_process_running(u32::MAX));
        assert!(!is_process_running(i32::MAX as u32 + 1));
    }

    #[cfg(unix)]
    #[test]
    fn reaped_child_is_not_running() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        assert!(!is_process_running(pid));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn init_process_counts_as_running() {
        // PID 1 exists; unprivileged callers get EPERM, which still means alive.
        assert!(is_process_running(1));
    }
}
