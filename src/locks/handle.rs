//! Handle to an acquired lock.

use super::record::LockRecord;
use crate::backend::{self, Backend, FileType, Id, ObjectHandle};
use crate::cancel::CancelToken;
use crate::error::{LockError, Result};
use chrono::{Duration, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Capability for one held lock.
///
/// The handle tracks the storage id of the record currently backing the
/// lock. [`refresh`](Self::refresh) swaps that record for a newer one,
/// [`release`](Self::release) deletes it.
///
/// When dropped without being released, the handle deletes its record.
/// If deletion fails during drop, a warning is logged; the record then ages
/// out and is removed by the next stale-lock sweep.
pub struct LockHandle {
    backend: Arc<dyn Backend>,
    id: Id,
    record: LockRecord,
    released: bool,
    cancel: CancelToken,
}

impl LockHandle {
    pub(super) fn new(
        backend: Arc<dyn Backend>,
        id: Id,
        record: LockRecord,
        cancel: CancelToken,
    ) -> Self {
        Self {
            backend,
            id,
            record,
            released: false,
            cancel,
        }
    }

    /// Storage id of the record currently backing this lock.
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn record(&self) -> &LockRecord {
        &self.record
    }

    pub fn is_exclusive(&self) -> bool {
        self.record.exclusive
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn object(&self) -> ObjectHandle {
        ObjectHandle::new(FileType::Lock, self.id)
    }

    /// Re-issue the lock with the current time.
    ///
    /// Writes a new record, then deletes the old one. The new record always
    /// gets a different id. If deleting the old record fails, the error is
    /// logged and the refresh still succeeds: two records for the same holder
    /// are harmless, and the leftover goes stale on its own.
    ///
    /// Fails with `NotLocked` if the handle was released or if another process
    /// already removed our record as stale; in that case nothing is written,
    /// since the repository may meanwhile be locked by someone else.
    pub fn refresh(&mut self) -> Result<()> {
        if self.released {
            return Err(LockError::NotLocked(
                "cannot refresh a released lock".to_string(),
            ));
        }

        self.cancel.check()?;
        let old = self.object();
        if !self.backend.exists(&old)? {
            self.released = true;
            return Err(LockError::NotLocked(format!(
                "lock {} was removed by another process",
                self.id.short()
            )));
        }

        let mut record = self.record.clone();
        let now = Utc::now();
        // The timestamp must move forward, or the id would not change.
        record.time = if now > self.record.time {
            now
        } else {
            self.record.time + Duration::nanoseconds(1)
        };

        self.cancel.check()?;
        let new_id = backend::save_json(self.backend.as_ref(), FileType::Lock, &record)?;
        self.id = new_id;
        self.record = record;
        debug!(old = %old.id.short(), new = %new_id.short(), "refreshed lock");

        if let Err(e) = self.backend.remove(&old) {
            warn!(
                lock = %old.id.short(),
                error = %e,
                "failed to remove previous lock record after refresh; it will expire as stale"
            );
        }

        Ok(())
    }

    /// Delete the lock record.
    ///
    /// A second call fails with `NotLocked`. So does releasing a lock whose
    /// record was already swept by another process.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Err(LockError::NotLocked(format!(
                "lock {} was already released",
                self.id.short()
            )));
        }

        match self.backend.remove(&self.object()) {
            Ok(()) => {
                self.released = true;
                debug!(lock = %self.id.short(), "released lock");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                self.released = true;
                Err(LockError::NotLocked(format!(
                    "lock {} no longer exists",
                    self.id.short()
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Give up the handle without deleting its record.
    ///
    /// Used by tooling that deliberately leaves a record behind.
    pub fn detach(mut self) -> Id {
        self.released = true;
        self.id
    }
}

impl fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("id", &self.id)
            .field("exclusive", &self.record.exclusive)
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.backend.remove(&self.object()) {
            Ok(()) => debug!(lock = %self.id.short(), "released lock on drop"),
            Err(e) if e.is_not_found() => {}
            Err(e) => warn!(
                lock = %self.id.short(),
                error = %e,
                "failed to release lock on drop"
            ),
        }
    }
}
