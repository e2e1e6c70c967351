//! Error types for repolock.
//!
//! Uses thiserror for derive macros. Callers tell a lock conflict apart from
//! a backend failure with [`LockError::is_already_locked`]; only the former is
//! worth waiting on.

use crate::exit_codes;
use crate::locks::LockConflict;
use thiserror::Error;

/// Main error type for lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// A non-stale lock conflicts with the requested one.
    #[error("repository is already locked {0}")]
    AlreadyLocked(Box<LockConflict>),

    /// The handle was already released, or its record was removed by someone else.
    #[error("lock is not held: {0}")]
    NotLocked(String),

    /// The backend has no object under the requested name.
    #[error("object not found: {0}")]
    NotFound(String),

    /// Listing, loading, saving or deleting an object failed.
    #[error("backend operation failed: {0}")]
    Backend(String),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The configuration or command line is invalid.
    #[error("{0}")]
    Config(String),
}

impl LockError {
    /// True if the error reports a conflicting lock held by someone else.
    pub fn is_already_locked(&self) -> bool {
        matches!(self, LockError::AlreadyLocked(_))
    }

    /// True if the handle no longer backs a stored record.
    pub fn is_not_locked(&self) -> bool {
        matches!(self, LockError::NotLocked(_))
    }

    /// True if a backend object was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LockError::NotFound(_))
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LockError::AlreadyLocked(_) | LockError::NotLocked(_) => exit_codes::LOCK_FAILURE,
            LockError::NotFound(_) | LockError::Backend(_) => exit_codes::BACKEND_FAILURE,
            LockError::Cancelled => exit_codes::CANCELLED,
            LockError::Config(_) => exit_codes::USER_ERROR,
        }
    }
}

/// Result type alias for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;
