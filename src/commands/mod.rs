//! Command implementations for file-semaphore.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command builds one [`Semaphore`] from the global
//! options, calls it, and renders the result; no locking logic lives here.

mod acquire;
mod clean;
mod output;
mod release;
mod status;
mod wait;


pub use output::report_error;

use crate::cli::{Cli, Command, GlobalOptions};
use file_semaphore::{Result, Semaphore, SemaphoreConfig, SystemHost};
use output::Output;
use std::path::Path;

/// Dispatch a command to its implementation.
///
/// Returns the exit code for a command that ran to completion. Errors carry
/// their own exit code via [`SemaphoreError::exit_code`](file_semaphore::SemaphoreError::exit_code).
pub fn dispatch(cli: &Cli) -> Result<i32> {
    let out = Output::new(&cli.options, cli.command.name());
    let semaphore = open_semaphore(cli.command.lock_path(), &cli.options)?;

    match &cli.command {
        Command::Try(_) => acquire::cmd_try(&semaphore, &cli.options, &out),
        Command::Acquire(_) => acquire::cmd_acquire(&semaphore, &cli.options, &out),
        Command::Release(args) => release::cmd_release(&semaphore, args.force, &out),
        Command::Status(_) => status::cmd_status(&semaphore, &out),
        Command::Wait(_) => wait::cmd_wait(&semaphore, &cli.options, &out),
        Command::Clean(_) => clean::cmd_clean(&semaphore, &out),
    }
}

/// Build the effective config: defaults, then the config file, then flags.
fn build_config(options: &GlobalOptions) -> Result<SemaphoreConfig> {
    let mut config = match &options.config {
        Some(path) => SemaphoreConfig::load(path)?,
        None => SemaphoreConfig::default(),
    };

    if let Some(stale) = options.stale {
        config.stale_timeout_ms = (stale > 0).then(|| stale.saturating_mul(1000));
    }
    if let Some(retry_ms) = options.retry_ms {
        config.retry_interval_ms = retry_ms;
    }
    if let Some(timeout) = options.timeout {
        config = config.with_acquire_timeout(Some(timeout));
    }

    Ok(config)
}

fn open_semaphore(path: &Path, options: &GlobalOptions) -> Result<Semaphore> {
    let pid = options.pid.unwrap_or_else(default_holder_pid);
    Semaphore::with_host(path, build_config(options)?, SystemHost::for_pid(pid))
}

/// The process that invoked the CLI, so that a later `release` from the same
/// shell is recognized as the owner.
#[cfg(unix)]
fn default_holder_pid() -> u32 {
    std::os::unix::process::parent_id()
}

#[cfg(not(unix))]
fn default_holder_pid() -> u32 {
    std::process::id()
}
