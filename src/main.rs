//! hubgate binary entry point.

use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    hubgate::cli::run()
}
