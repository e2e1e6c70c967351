//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for the lock protocol.
///
/// This struct represents the contents of `repolock.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minutes after which a lock that has not been refreshed is considered stale.
    #[serde(default = "default_stale_timeout_minutes")]
    pub stale_timeout_minutes: u32,

    /// Minutes a lock timestamp may lie in the future before it is reported
    /// as clock skew. Such locks are still never judged stale by age.
    #[serde(default = "default_clock_skew_minutes")]
    pub clock_skew_minutes: u32,

    /// Minutes between refreshes of a held lock. Must be below the stale timeout.
    #[serde(default = "default_refresh_interval_minutes")]
    pub refresh_interval_minutes: u32,

    /// Seconds to keep retrying an acquisition while the repository is locked
    /// (0 disables retrying).
    #[serde(default)]
    pub retry_lock_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stale_timeout_minutes: default_stale_timeout_minutes(),
            clock_skew_minutes: default_clock_skew_minutes(),
            refresh_interval_minutes: default_refresh_interval_minutes(),
            retry_lock_seconds: 0,
        }
    }
}
