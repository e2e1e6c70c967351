//! The persisted lock record.

use crate::process::HostIdentity;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One held lock, as stored in the repository.
///
/// A record is never modified in place: its storage id is the hash of its
/// serialized form, so refreshing a lock writes a new record and deletes the
/// old one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Creation time, reset on every refresh. Drives time-based staleness.
    pub time: DateTime<Utc>,

    /// Exclusive locks coexist with nothing; shared locks coexist with
    /// other shared locks.
    pub exclusive: bool,

    /// Machine that created the record.
    pub hostname: String,

    /// Process id of the creator; only meaningful on `hostname`.
    pub pid: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
}

impl LockRecord {
    /// Record for a lock taken by `owner` at `time`.
    pub fn new(owner: &HostIdentity, exclusive: bool, time: DateTime<Utc>) -> Self {
        Self {
            time,
            exclusive,
            hostname: owner.hostname.clone(),
            pid: owner.pid,
            username: owner.username.clone(),
            uid: owner.uid,
            gid: owner.gid,
        }
    }

    /// Time elapsed since the record was written (negative if it lies in the future).
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.time)
    }

    pub fn kind(&self) -> &'static str {
        if self.exclusive { "exclusive" } else { "shared" }
    }
}

/// Format a duration the way operators read lock ages: `3d 4h`, `2h 5m`, `7m`.
pub fn format_age(age: Duration) -> String {
    if age < Duration::zero() {
        return format!("in {}", format_age(-age));
    }

    let minutes = age.num_minutes();
    let hours = age.num_hours();
    let days = age.num_days();

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

impl fmt::Display for LockRecord {
    /// Owner description, e.g. `PID 42 on host build-1 by alice (UID 1000, GID 1000)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID {} on host {}", self.pid, self.hostname)?;
        if let Some(user) = &self.username {
            write!(f, " by {}", user)?;
        }
        if let (Some(uid), Some(gid)) = (self.uid, self.gid) {
            write!(f, " (UID {}, GID {})", uid, gid)?;
        }
        Ok(())
    }
}
