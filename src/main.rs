//! Repolock: inspect and maintain advisory repository locks.
//!
//! This is the main entry point for the `repolock` CLI. It parses arguments,
//! sets up logging, dispatches to the appropriate command handler, and maps
//! errors to exit codes.

mod cli;
mod commands;

use cli::Cli;
use repolock::context::RepoContext;
use repolock::exit_codes;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let result = RepoContext::resolve(cli.repo.as_deref(), cli.config.as_deref())
        .and_then(|ctx| commands::dispatch(&ctx, cli.command));

    match result {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
