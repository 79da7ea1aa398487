//! Implementation of the `clean` command.
//!
//! Removes the lock file only when it is stale and its holder is gone, plus
//! any temp files left behind by dead processes. A live or corrupt lock is
//! never touched; use `release --force` for that.

use super::output::Output;
use file_semaphore::{Result, Semaphore, exit_codes};
use serde_json::json;

/// Execute the `file-semaphore clean` command.
pub(super) fn cmd_clean(semaphore: &Semaphore, out: &Output) -> Result<i32> {
    let report = semaphore.clean_stale_report()?;
    let path = semaphore.path();

    out.emit(
        || {
            if !report.removed_any() {
                return format!("Nothing to clean for {}", path.display());
            }
            let mut lines = Vec::new();
            if report.lock_removed {
                lines.push(format!("Removed stale lock {}", path.display()));
            }
            if report.temp_files_removed > 0 {
                lines.push(format!(
                    "Removed {} orphaned temp file(s)",
                    report.temp_files_removed
                ));
            }
            lines.join("\n")
        },
        json!({
            "path": path.display().to_string(),
            "removed": report.removed_any(),
            "lock_removed": report.lock_removed,
            "temp_files_removed": report.temp_files_removed,
        }),
    );
    Ok(exit_codes::SUCCESS)
}
