//! Command implementations for repolock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command resolves the repository context first.

use crate::cli::{Command, CreateStaleArgs, HoldArgs, UnlockArgs};
use repolock::context::RepoContext;
use repolock::error::Result;
use repolock::locks::LockKeeper;
use std::time::Duration;

/// Dispatch a command to its implementation.
pub fn dispatch(ctx: &RepoContext, command: Command) -> Result<()> {
    match command {
        Command::List => cmd_list(ctx),
        Command::Unlock(args) => cmd_unlock(ctx, args),
        Command::Hold(args) => cmd_hold(ctx, args),
        Command::CreateStale(args) => cmd_create_stale(ctx, args),
    }
}

fn cmd_list(ctx: &RepoContext) -> Result<()> {
    let locker = ctx.locker()?;
    let locks = locker.list_locks()?;

    if locks.is_empty() {
        println!("No locks.");
        return Ok(());
    }

    println!("Locks ({}):", locks.len());
    for lock in &locks {
        println!("  {}", lock);
    }

    let stale_count = locks.iter().filter(|l| l.is_stale).count();
    if stale_count > 0 {
        println!();
        println!(
            "{} stale lock(s) (older than {} min or owned by an exited local process).",
            stale_count, ctx.config.stale_timeout_minutes
        );
        println!("Remove them with: repolock unlock");
    }

    Ok(())
}

fn cmd_unlock(ctx: &RepoContext, args: UnlockArgs) -> Result<()> {
    let locker = ctx.locker()?;

    let removed = if args.remove_all {
        locker.remove_all_locks()?
    } else {
        locker.remove_stale_locks()?
    };

    println!("successfully removed {} locks", removed);
    Ok(())
}

fn cmd_hold(ctx: &RepoContext, args: HoldArgs) -> Result<()> {
    let locker = ctx.locker()?;
    let retry_for = args
        .retry_lock
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.config.retry_lock());

    let handle = locker.acquire_with_retry(args.exclusive, retry_for)?;
    println!(
        "acquired {} lock {}, holding for {}s",
        handle.record().kind(),
        handle.id().short(),
        args.seconds
    );

    let keeper = LockKeeper::start(handle, ctx.config.refresh_interval());
    std::thread::sleep(Duration::from_secs(args.seconds));
    keeper.release()?;

    println!("released lock");
    Ok(())
}

fn cmd_create_stale(ctx: &RepoContext, args: CreateStaleArgs) -> Result<()> {
    let locker = ctx.locker()?;

    let handle = if args.exclusive {
        locker.new_stale_exclusive_lock()?
    } else {
        locker.new_stale_lock()?
    };

    println!("{}", handle.detach());
    Ok(())
}
