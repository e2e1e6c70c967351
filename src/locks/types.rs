//! Lock listing and conflict descriptions.

use super::record::{LockRecord, format_age};
use crate::backend::Id;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Information about a stored lock.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// Storage id of the record.
    pub id: Id,

    /// The record itself.
    pub record: LockRecord,

    /// Age of the record when it was listed.
    pub age: Duration,

    /// Whether the record was stale when it was listed.
    pub is_stale: bool,
}

impl fmt::Display for LockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, PID {} on {}, age {}{})",
            self.id.short(),
            self.record.kind(),
            self.record.pid,
            self.record.hostname,
            format_age(self.age),
            if self.is_stale { ", STALE" } else { "" }
        )
    }
}

/// The lock that blocked an acquisition.
#[derive(Debug, Clone)]
pub struct LockConflict {
    pub id: Id,
    pub record: LockRecord,
    pub age: Duration,
}

impl LockConflict {
    pub fn new(id: Id, record: LockRecord, now: DateTime<Utc>) -> Self {
        let age = record.age(now);
        Self { id, record, age }
    }
}

impl fmt::Display for LockConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}by {}\nlock was created at {} ({} ago)\nstorage ID {}",
            if self.record.exclusive { "exclusively " } else { "" },
            self.record,
            self.record.time.format("%Y-%m-%d %H:%M:%S UTC"),
            format_age(self.age),
            self.id.short()
        )
    }
}
