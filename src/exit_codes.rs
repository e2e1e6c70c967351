//! Exit code constants for the repolock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: Backend failure (list/load/save/delete)
//! - 3: Lock failure (already locked, not locked)
//! - 4: Operation cancelled

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or an invalid configuration file.
pub const USER_ERROR: i32 = 1;

/// Backend failure: the object store could not be listed, read, written or cleaned.
pub const BACKEND_FAILURE: i32 = 2;

/// Lock failure: the repository is locked by someone else, or our lock is gone.
pub const LOCK_FAILURE: i32 = 3;

/// The operation was cancelled before it completed.
pub const CANCELLED: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, BACKEND_FAILURE, LOCK_FAILURE, CANCELLED];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }
}
