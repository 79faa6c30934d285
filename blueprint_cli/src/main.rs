//! CLI entrypoint for `forge-blueprint`.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use forge_blueprint_cli::cli::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    let Err(err) = forge_blueprint_cli::run(&args, &mut io::stdout().lock()) else {
        return ExitCode::SUCCESS;
    };
    if writeln!(io::stderr().lock(), "forge-blueprint: {err}").is_err() {
        tracing::error!(error = %err, "blueprint load failed");
    }
    ExitCode::FAILURE
}
