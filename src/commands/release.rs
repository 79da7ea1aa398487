//! Implementation of the `release` command.

use super::output::Output;
use file_semaphore::{Result, Semaphore, exit_codes};
use serde_json::json;

/// Execute the `file-semaphore release` command.
pub(super) fn cmd_release(semaphore: &Semaphore, force: bool, out: &Output) -> Result<i32> {
    semaphore.release(force)?;

    let path = semaphore.path();
    out.emit(
        || {
            if force {
                format!("Force-released {}", path.display())
            } else {
                format!("Released {}", path.display())
            }
        },
        json!({ "path": path.display().to_string(), "force": force }),
    );
    Ok(exit_codes::SUCCESS)
}
