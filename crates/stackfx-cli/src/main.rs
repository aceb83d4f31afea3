//! CLI entrypoint for the stackfx filter catalogue.
//!
//! The binary delegates to [`stackfx_cli::run`], which loads configuration,
//! installs telemetry, discovers filter packages, and executes the requested
//! command.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    stackfx_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
