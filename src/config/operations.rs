//! Config loading, validation, and duration accessors.

use super::model::Config;
use crate::error::{LockError, Result};
use chrono::Duration;
use std::path::Path;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(LockError::Config)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| LockError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LockError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `stale_timeout_minutes` must be positive
    /// - `refresh_interval_minutes` must be positive and below `stale_timeout_minutes`
    pub fn validate(&self) -> Result<()> {
        if self.stale_timeout_minutes == 0 {
            return Err(LockError::Config(
                "config validation failed: stale_timeout_minutes must be greater than 0"
                    .to_string(),
            ));
        }

        if self.refresh_interval_minutes == 0 {
            return Err(LockError::Config(
                "config validation failed: refresh_interval_minutes must be greater than 0"
                    .to_string(),
            ));
        }

        if self.refresh_interval_minutes >= self.stale_timeout_minutes {
            return Err(LockError::Config(format!(
                "config validation failed: refresh_interval_minutes ({}) must be less than stale_timeout_minutes ({})",
                self.refresh_interval_minutes, self.stale_timeout_minutes
            )));
        }

        Ok(())
    }

    /// Age past which a lock is stale regardless of host.
    pub fn stale_timeout(&self) -> Duration {
        Duration::minutes(i64::from(self.stale_timeout_minutes))
    }

    /// How far in the future a lock timestamp may be before it is reported.
    pub fn clock_skew(&self) -> Duration {
        Duration::minutes(i64::from(self.clock_skew_minutes))
    }

    /// Interval between refreshes of a held lock.
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.refresh_interval_minutes) * 60)
    }

    /// How long an acquisition keeps retrying while the repository is locked.
    pub fn retry_lock(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.retry_lock_seconds)
    }
}
