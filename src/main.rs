//! file-semaphore: cross-process advisory locks from the command line.
//!
//! This is the main entry point for the `file-semaphore` CLI. It parses
//! arguments, dispatches to the appropriate command handler, and handles
//! errors with proper exit codes.

mod cli;
mod commands;
mod logging;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(e) = logging::init_tracing(cli.options.verbose) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    match commands::dispatch(&cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            commands::report_error(&err, &cli.options, cli.command.name());
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
