//! Advisory repository locks on top of plain object storage.
//!
//! Every lock is an object of kind [`FileType::Lock`](crate::backend::FileType)
//! holding a JSON [`LockRecord`]: timestamp, shared/exclusive flag, hostname
//! and process id of the holder.
//!
//! # Conflict rules
//!
//! - A shared lock is refused while any exclusive lock exists.
//! - An exclusive lock is refused while any lock exists.
//! - Stale locks are ignored for both rules.
//!
//! # Staleness
//!
//! A lock is stale when it is older than the stale timeout, or when it was
//! created on this host by a process that is no longer running. Holders of
//! long-running locks refresh them (see [`LockKeeper`]) so they never age out.
//!
//! # Guarantees
//!
//! The protocol is cooperative and best effort. The backend offers no
//! atomic check-and-create, so two exclusive acquisitions racing within the
//! same instant can both succeed. See [`Locker::acquire`].

mod handle;
mod keeper;
mod operations;
mod record;
mod retry;
mod stale;
mod types;


// Re-export public API
pub use handle::LockHandle;
pub use keeper::LockKeeper;
pub use operations::Locker;
pub use record::{LockRecord, format_age};
pub use stale::{StalePolicy, is_future_dated, is_stale};
pub use types::{LockConflict, LockInfo};
