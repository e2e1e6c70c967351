//! Configuration constants and defaults for repolock.

/// File name looked up in the repository root when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "repolock.yaml";

// Default value functions for serde
pub(crate) fn default_stale_timeout_minutes() -> u32 {
    30
}
pub(crate) fn default_clock_skew_minutes() -> u32 {
    5
}
pub(crate) fn default_refresh_interval_minutes() -> u32 {
    5
}
