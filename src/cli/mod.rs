//! CLI argument parsing for file-semaphore.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cross-process advisory lock backed by a single lock file.
///
/// A lock is held while its file exists. Shell scripts can bracket a critical
/// section with `acquire` and `release`; by default the lock is recorded as
/// owned by the calling shell, not by this short-lived process.
#[derive(Parser, Debug)]
#[command(name = "file-semaphore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub options: GlobalOptions,
}

/// Available commands for file-semaphore.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Try to take the lock once, without waiting.
    ///
    /// Exits 0 if the lock was acquired, 1 if it is held.
    Try(LockArgs),

    /// Take the lock, waiting until it is free.
    ///
    /// Waits indefinitely unless `--timeout` (or the config file) sets a cap.
    Acquire(LockArgs),

    /// Release the lock.
    ///
    /// Only the recorded holder may release unless `--force` is given.
    Release(ReleaseArgs),

    /// Show who holds the lock.
    ///
    /// Exits 0 if the lock is free, 1 if a lock file exists.
    Status(LockArgs),

    /// Wait until the lock is free, without taking it.
    Wait(LockArgs),

    /// Remove a stale lock and orphaned temp files.
    ///
    /// A lock is stale when it is older than the stale timeout and its holder
    /// is no longer running.
    Clean(LockArgs),
}

/// Positional arguments shared by every command.
#[derive(Args, Debug, Clone)]
pub struct LockArgs {
    /// Path to the lock file. The parent directory must exist.
    pub lock_path: PathBuf,
}

/// Arguments for the `release` command.
#[derive(Args, Debug, Clone)]
pub struct ReleaseArgs {
    #[command(flatten)]
    pub lock: LockArgs,

    /// Remove the lock even if another process holds it.
    #[arg(short, long)]
    pub force: bool,
}

/// Options accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Give up waiting after this many seconds (fractions allowed).
    #[arg(long, global = true, value_name = "SECS", value_parser = parse_seconds)]
    pub timeout: Option<Duration>,

    /// Treat locks older than this many seconds as stale; 0 disables staleness.
    #[arg(long, global = true, value_name = "SECS")]
    pub stale: Option<u64>,

    /// Poll interval while waiting, in milliseconds.
    #[arg(long, global = true, value_name = "MS")]
    pub retry_ms: Option<u64>,

    /// Description stored in the lock file.
    #[arg(long, global = true, value_name = "TEXT")]
    pub tag: Option<String>,

    /// PID recorded as the lock holder. Defaults to the parent process.
    #[arg(long, global = true, value_name = "PID")]
    pub pid: Option<u32>,

    /// YAML config file; command-line flags override its values.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Print nothing on success.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log lock activity to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Command {
    /// The lock path this command operates on.
    pub fn lock_path(&self) -> &Path {
        match self {
            Command::Try(args)
            | Command::Acquire(args)
            | Command::Status(args)
            | Command::Wait(args)
            | Command::Clean(args) => &args.lock_path,
            Command::Release(args) => &args.lock.lock_path,
        }
    }

    /// Name used in JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Try(_) => "try",
            Command::Acquire(_) => "acquire",
            Command::Release(_) => "release",
            Command::Status(_) => "status",
            Command::Wait(_) => "wait",
            Command::Clean(_) => "clean",
        }
    }
}

fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", raw))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("'{}' is not a valid duration", raw))
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
