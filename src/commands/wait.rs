//! Implementation of the `wait` command.

use super::output::Output;
use crate::cli::GlobalOptions;
use file_semaphore::{Result, Semaphore, exit_codes};
use serde_json::json;

/// Execute the `file-semaphore wait` command.
///
/// Nothing is acquired: the lock may be taken again before the caller acts.
pub(super) fn cmd_wait(semaphore: &Semaphore, options: &GlobalOptions, out: &Output) -> Result<i32> {
    let timeout = options
        .timeout
        .or_else(|| semaphore.config().acquire_timeout());
    semaphore.wait_until_free(timeout)?;

    let path = semaphore.path();
    out.emit(
        || format!("{} is free", path.display()),
        json!({ "path": path.display().to_string() }),
    );
    Ok(exit_codes::SUCCESS)
}
