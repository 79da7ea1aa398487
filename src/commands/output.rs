//! Text and JSON rendering.

use crate::cli::GlobalOptions;
use file_semaphore::{LockRecord, SemaphoreError};
use serde_json::{Value, json};

/// Where command results go.
///
/// JSON mode prints exactly one object per invocation on stdout. Text mode
/// prints human-readable lines unless `--quiet` is set.
#[derive(Debug, Clone)]
pub(super) struct Output {
    json: bool,
    quiet: bool,
    command: &'static str,
}

impl Output {
    pub(super) fn new(options: &GlobalOptions, command: &'static str) -> Self {
        Self {
            json: options.json,
            quiet: options.quiet,
            command,
        }
    }

    /// Print a successful result.
    ///
    /// `details` is merged into the JSON object next to `ok` and `command`.
    pub(super) fn emit(&self, text: impl FnOnce() -> String, details: Value) {
        if self.json {
            let mut object = json!({ "ok": true, "command": self.command });
            if let (Some(target), Value::Object(extra)) = (object.as_object_mut(), details) {
                target.extend(extra);
            }
            println!("{}", object);
        } else if !self.quiet {
            println!("{}", text());
        }
    }
}

/// Render a lock record for JSON output.
pub(super) fn record_json(record: &LockRecord, now: u64) -> Value {
    json!({
        "pid": record.pid,
        "timestamp": record.timestamp,
        "tag": record.tag,
        "acquired_at": record.acquired_at().map(|t| t.to_rfc3339()),
        "age": record.age_string(now),
    })
}

/// Print an error in the format selected on the command line.
pub fn report_error(err: &SemaphoreError, options: &GlobalOptions, command: &str) {
    if options.json {
        println!("{}", error_json(err, command));
    } else {
        eprintln!("Error: {}", err);
    }
}

fn error_json(err: &SemaphoreError, command: &str) -> Value {
    json!({
        "ok": false,
        "command": command,
        "error": {
            "kind": err.kind(),
            "message": err.to_string(),
            "holder_pid": err.holder_pid(),
        },
    })
}
