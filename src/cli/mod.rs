//! CLI argument parsing for repolock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Repolock: inspect and maintain advisory locks of a repository.
///
/// Locks are stored as objects under `<repo>/locks/`. Shared locks coexist;
/// an exclusive lock excludes every other lock.
#[derive(Parser, Debug)]
#[command(name = "repolock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Repository directory (default: current directory).
    #[arg(short, long, global = true)]
    pub repo: Option<PathBuf>,

    /// Configuration file (default: `<repo>/repolock.yaml` if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for repolock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all locks with their owner, age and staleness.
    List,

    /// Remove stale locks.
    ///
    /// With --remove-all, every lock is removed, including locks held by
    /// running processes. Only use it when you are sure nobody is working
    /// on the repository.
    Unlock(UnlockArgs),

    /// Take a lock and hold it, refreshing it in the background.
    Hold(HoldArgs),

    /// Write a lock that is already stale, without checking for conflicts.
    ///
    /// Intended for recovery drills and for testing stale-lock handling.
    CreateStale(CreateStaleArgs),
}

/// Arguments for the `unlock` command.
#[derive(Parser, Debug)]
pub struct UnlockArgs {
    /// Remove all locks, even active ones.
    #[arg(long)]
    pub remove_all: bool,
}

/// Arguments for the `hold` command.
#[derive(Parser, Debug)]
pub struct HoldArgs {
    /// Take an exclusive lock instead of a shared one.
    #[arg(long)]
    pub exclusive: bool,

    /// How long to hold the lock, in seconds.
    #[arg(long, default_value_t = 60)]
    pub seconds: u64,

    /// Keep retrying for this many seconds while the repository is locked
    /// (default: `retry_lock_seconds` from the configuration).
    #[arg(long)]
    pub retry_lock: Option<u64>,
}

/// Arguments for the `create-stale` command.
#[derive(Parser, Debug)]
pub struct CreateStaleArgs {
    /// Create an exclusive lock instead of a shared one.
    #[arg(long)]
    pub exclusive: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
