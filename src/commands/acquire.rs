//! Implementation of the `try` and `acquire` commands.

use super::output::{Output, record_json};
use crate::cli::GlobalOptions;
use file_semaphore::{AcquireOptions, Host, LockRecord, Result, Semaphore, exit_codes};
use serde_json::json;

/// Execute the `file-semaphore try` command.
pub(super) fn cmd_try(semaphore: &Semaphore, options: &GlobalOptions, out: &Output) -> Result<i32> {
    let record = semaphore.try_acquire(options.tag.as_deref())?;
    report_acquired(semaphore, &record, out);
    Ok(exit_codes::SUCCESS)
}

/// Execute the `file-semaphore acquire` command.
///
/// `--timeout` was already folded into the config's acquire timeout, so the
/// options passed here only carry the tag.
pub(super) fn cmd_acquire(
    semaphore: &Semaphore,
    options: &GlobalOptions,
    out: &Output,
) -> Result<i32> {
    let acquire = AcquireOptions {
        timeout: None,
        tag: options.tag.clone(),
    };
    let record = semaphore.acquire(acquire)?;
    report_acquired(semaphore, &record, out);
    Ok(exit_codes::SUCCESS)
}

fn report_acquired(semaphore: &Semaphore, record: &LockRecord, out: &Output) {
    let path = semaphore.path();
    let now = semaphore.host().now_seconds();

    out.emit(
        || format!("Acquired {} (pid {})", path.display(), record.pid),
        json!({
            "path": path.display().to_string(),
            "record": record_json(record, now),
        }),
    );
}
