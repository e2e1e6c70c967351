//! repolock: advisory shared/exclusive locks for repositories kept on plain
//! object storage.
//!
//! Storage backends here offer no locking primitive and no transactions,
//! only "save", "list", "load", "remove" and "exists". Locks are therefore
//! ordinary content-addressed objects, and conflicts are detected by listing
//! them before taking a new one. Abandoned locks are recognised by age and,
//! for locks created on this machine, by checking whether the owning process
//! still runs.
//!
//! ```no_run
//! use repolock::backend::LocalBackend;
//! use repolock::config::Config;
//! use repolock::locks::Locker;
//! use std::sync::Arc;
//!
//! let locker = Locker::new(Arc::new(LocalBackend::new("/srv/repo")), &Config::default())?;
//! let mut lock = locker.lock_exclusive()?;
//! // ... prune the repository ...
//! lock.release()?;
//! # Ok::<(), repolock::error::LockError>(())
//! ```

pub mod backend;
pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod locks;
pub mod process;

#[cfg(test)]
mod test_support;
