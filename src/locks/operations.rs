//! Lock acquisition and maintenance.
//!
//! # Races
//!
//! The backend has no atomic check-and-create. Acquisition lists the
//! existing records, decides, and then writes its own record in a separate
//! call; two processes asking for exclusive locks within that window can
//! both succeed. Client-side locking cannot close the gap because the
//! competitors live in other processes or on other hosts, so the window is
//! accepted. Keep the time between listing and writing short.

use super::handle::LockHandle;
use super::record::LockRecord;
use super::stale::{StalePolicy, is_future_dated, is_stale};
use super::types::{LockConflict, LockInfo};
use crate::backend::{self, Backend, FileType, Id, ObjectHandle};
use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::{LockError, Result};
use crate::process::{HostIdentity, LocalProcessProbe, ProcessProbe};
use chrono::{DateTime, Duration, Utc};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entry point to the lock protocol for one repository.
///
/// A `Locker` holds the backend, the staleness thresholds and the identity
/// written into new records. It is cheap to share between threads.
pub struct Locker {
    pub(super) backend: Arc<dyn Backend>,
    pub(super) policy: StalePolicy,
    pub(super) identity: HostIdentity,
    pub(super) probe: Arc<dyn ProcessProbe>,
    pub(super) cancel: CancelToken,
}

impl std::fmt::Debug for Locker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locker")
            .field("policy", &self.policy)
            .field("identity", &self.identity)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl Locker {
    /// Create a locker for the current process on this machine.
    ///
    /// Fails with `LockError::Config` if `config` does not validate.
    pub fn new(backend: Arc<dyn Backend>, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            policy: StalePolicy::from_config(config),
            identity: HostIdentity::current()?,
            probe: Arc::new(LocalProcessProbe),
            cancel: CancelToken::new(),
        })
    }

    /// Override the identity written into new records and used as observer hostname.
    pub fn with_identity(mut self, identity: HostIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Override how local process liveness is checked.
    pub fn with_probe(mut self, probe: Arc<dyn ProcessProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Attach a cancellation token checked before every backend call.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn identity(&self) -> &HostIdentity {
        &self.identity
    }

    pub fn policy(&self) -> &StalePolicy {
        &self.policy
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Whether `record` counts as abandoned when seen from this host right now.
    pub fn is_stale(&self, record: &LockRecord) -> bool {
        self.is_stale_at(record, Utc::now())
    }

    fn is_stale_at(&self, record: &LockRecord, now: DateTime<Utc>) -> bool {
        is_stale(
            record,
            &self.identity.hostname,
            now,
            &self.policy,
            self.probe.as_ref(),
        )
    }

    /// Acquire a shared lock.
    pub fn lock(&self) -> Result<LockHandle> {
        self.acquire(false)
    }

    /// Acquire an exclusive lock.
    pub fn lock_exclusive(&self) -> Result<LockHandle> {
        self.acquire(true)
    }

    /// Acquire a lock after checking the repository for conflicting locks.
    ///
    /// # Returns
    ///
    /// * `Ok(LockHandle)` - The lock record was written
    /// * `Err(LockError::AlreadyLocked)` - A non-stale conflicting lock exists
    /// * `Err(LockError::Backend)` - Listing, loading or saving failed
    pub fn acquire(&self, exclusive: bool) -> Result<LockHandle> {
        self.check_for_other_locks(exclusive)?;

        let record = LockRecord::new(&self.identity, exclusive, Utc::now());
        let handle = self.create(record)?;
        debug!(lock = %handle.id().short(), exclusive, "acquired lock");
        Ok(handle)
    }

    /// Write a shared lock that is stale from the start, without checking for conflicts.
    pub fn new_stale_lock(&self) -> Result<LockHandle> {
        self.create_stale(false)
    }

    /// Write an exclusive lock that is stale from the start, without checking for conflicts.
    pub fn new_stale_exclusive_lock(&self) -> Result<LockHandle> {
        self.create_stale(true)
    }

    fn create_stale(&self, exclusive: bool) -> Result<LockHandle> {
        let time = Utc::now() - self.policy.stale_timeout - Duration::minutes(1);
        let record = LockRecord::new(&self.identity, exclusive, time);
        self.create(record)
    }

    fn create(&self, record: LockRecord) -> Result<LockHandle> {
        self.cancel.check()?;
        let id = backend::save_json(self.backend.as_ref(), FileType::Lock, &record)?;
        Ok(LockHandle::new(
            Arc::clone(&self.backend),
            id,
            record,
            self.cancel.clone(),
        ))
    }

    /// Fail with `AlreadyLocked` if a non-stale lock conflicts with the requested one.
    fn check_for_other_locks(&self, exclusive: bool) -> Result<()> {
        let now = Utc::now();
        let mut conflict = None;

        self.for_each_lock(&mut |id, record| {
            if is_future_dated(&record, now, &self.policy) {
                warn!(
                    lock = %id.short(),
                    time = %record.time,
                    "lock timestamp lies in the future; check the clocks of {}",
                    record.hostname
                );
            }

            if self.is_stale_at(&record, now) {
                debug!(lock = %id.short(), "ignoring stale lock");
                return Ok(ControlFlow::Continue(()));
            }

            if exclusive || record.exclusive {
                conflict = Some(LockConflict::new(id, record, now));
                return Ok(ControlFlow::Break(()));
            }

            Ok(ControlFlow::Continue(()))
        })?;

        match conflict {
            Some(conflict) => Err(LockError::AlreadyLocked(Box::new(conflict))),
            None => Ok(()),
        }
    }

    /// Load every lock record and hand it to `visit`.
    ///
    /// Records that disappear between listing and loading were removed
    /// concurrently and are skipped. Any other load failure aborts.
    fn for_each_lock(
        &self,
        visit: &mut dyn FnMut(Id, LockRecord) -> Result<ControlFlow<()>>,
    ) -> Result<()> {
        self.cancel.check()?;
        self.backend.list(FileType::Lock, &mut |id, _size| {
            self.cancel.check()?;
            match self.load(id) {
                Ok(record) => visit(id, record),
                Err(e) if e.is_not_found() => {
                    debug!(lock = %id.short(), "lock vanished while listing");
                    Ok(ControlFlow::Continue(()))
                }
                Err(e) => Err(e),
            }
        })
    }

    fn load(&self, id: Id) -> Result<LockRecord> {
        backend::load_json(
            self.backend.as_ref(),
            &ObjectHandle::new(FileType::Lock, id),
        )
    }

    /// List every lock record, oldest first.
    pub fn list_locks(&self) -> Result<Vec<LockInfo>> {
        let now = Utc::now();
        let mut locks = Vec::new();

        self.for_each_lock(&mut |id, record| {
            locks.push(LockInfo {
                id,
                age: record.age(now),
                is_stale: self.is_stale_at(&record, now),
                record,
            });
            Ok(ControlFlow::Continue(()))
        })?;

        locks.sort_by(|a, b| a.record.time.cmp(&b.record.time).then(a.id.cmp(&b.id)));
        Ok(locks)
    }

    /// Delete every stale lock record and return how many were removed.
    ///
    /// Records that cannot be loaded are never deleted. The sweep continues
    /// past them and reports the failure once it is done.
    pub fn remove_stale_locks(&self) -> Result<usize> {
        let now = Utc::now();
        let mut removed = 0;
        let mut load_failures = Vec::new();

        self.cancel.check()?;
        self.backend.list(FileType::Lock, &mut |id, _size| {
            self.cancel.check()?;
            let record = match self.load(id) {
                Ok(record) => record,
                Err(e) if e.is_not_found() => return Ok(ControlFlow::Continue(())),
                Err(e) => {
                    warn!(lock = %id.short(), error = %e, "cannot load lock; leaving it in place");
                    load_failures.push(format!("{}: {}", id.short(), e));
                    return Ok(ControlFlow::Continue(()));
                }
            };

            if self.is_stale_at(&record, now) && self.remove(id)? {
                debug!(lock = %id.short(), "removed stale lock");
                removed += 1;
            }
            Ok(ControlFlow::Continue(()))
        })?;

        if !load_failures.is_empty() {
            return Err(LockError::Backend(format!(
                "removed {} stale locks but could not load {}: {}",
                removed,
                load_failures.len(),
                load_failures.join("; ")
            )));
        }

        Ok(removed)
    }

    /// Delete every lock record, stale or not, and return how many were removed.
    ///
    /// Only for explicit recovery by an operator: locks held by running
    /// processes are removed too.
    pub fn remove_all_locks(&self) -> Result<usize> {
        let mut removed = 0;

        self.cancel.check()?;
        self.backend.list(FileType::Lock, &mut |id, _size| {
            self.cancel.check()?;
            if self.remove(id)? {
                removed += 1;
            }
            Ok(ControlFlow::Continue(()))
        })?;

        warn!(removed, "removed all locks");
        Ok(removed)
    }

    /// Remove one record; `false` if someone else removed it first.
    fn remove(&self, id: Id) -> Result<bool> {
        match self.backend.remove(&ObjectHandle::new(FileType::Lock, id)) {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
