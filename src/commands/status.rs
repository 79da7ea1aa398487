//! Implementation of the `status` command.
//!
//! Reports whether the lock is held, by whom, for how long, and whether the
//! holder is still alive. Exits 0 when free and 1 when a lock file exists, so
//! scripts can branch on it directly.

use super::output::{Output, record_json};
use file_semaphore::{Host, LockStatus, Result, Semaphore, exit_codes};
use serde_json::json;
use std::path::Path;

/// Execute the `file-semaphore status` command.
pub(super) fn cmd_status(semaphore: &Semaphore, out: &Output) -> Result<i32> {
    let status = semaphore.status();
    let now = semaphore.host().now_seconds();
    let path = semaphore.path();

    out.emit(
        || render(path, &status, now),
        json!({
            "path": path.display().to_string(),
            "state": status.state(),
            "locked": status.locked,
            "record": status.record.as_ref().map(|r| record_json(r, now)),
            "is_stale": status.is_stale,
            "is_owned_by_caller": status.is_owned_by_caller,
            "holder_running": status.holder_running,
        }),
    );

    Ok(if status.locked {
        exit_codes::LOCK_HELD
    } else {
        exit_codes::SUCCESS
    })
}

fn render(path: &Path, status: &LockStatus, now: u64) -> String {
    let mut lines = vec![
        format!("Lock:   {}", path.display()),
        format!("State:  {}", status.state()),
    ];

    if let Some(record) = &status.record {
        let liveness = match status.holder_running {
            Some(true) => "running",
            Some(false) => "not running",
            None => "unknown",
        };
        lines.push(format!("Holder: pid {} ({})", record.pid, liveness));

        let acquired = record
            .acquired_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| record.timestamp.to_string());
        lines.push(format!("Since:  {} ({} ago)", acquired, record.age_string(now)));

        if let Some(tag) = &record.tag {
            lines.push(format!("Tag:    {}", tag));
        }
        if status.is_reclaimable() {
            lines.push("Stale:  yes, will be reclaimed by the next acquire".to_string());
        } else if status.is_stale {
            lines.push("Stale:  yes, but the holder is still running".to_string());
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use file_semaphore::LockRecord;

    #[test]
    fn test_render_unlocked() {
        let status = LockStatus {
            locked: false,
            record: None,
            is_stale: false,
            is_owned_by_caller: false,
            holder_running: None,
        };
        let text = render(Path::new("/tmp/x.lock"), &status, 0);
        assert!(text.contains("/tmp/x.lock"));
        assert!(text.contains("unlocked"));
        assert!(!text.contains("Holder"));
    }

    #[test]
    fn test_render_stale_holder() {
        let status = LockStatus {
            locked: true,
            record: Some(LockRecord::new(99, 0, Some("nightly".to_string()))),
            is_stale: true,
            is_owned_by_caller: false,
            holder_running: Some(false),
        };
        let text = render(Path::new("/tmp/x.lock"), &status, 7200);

        assert!(text.contains("pid 99 (not running)"));
        assert!(text.contains("1970-01-01 00:00:00 UTC (2h 0m ago)"));
        assert!(text.contains("Tag:    nightly"));
        assert!(text.contains("will be reclaimed"));
    }
}
