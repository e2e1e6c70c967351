use crate::backend::{self, Backend, FileType, Id, ListVisitor, MemoryBackend, ObjectHandle};
use crate::config::Config;
use crate::error::{LockError, Result};
use crate::locks::{LockRecord, Locker};
use crate::process::{HostIdentity, ProcessProbe};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) const TEST_HOST: &str = "host-a";
pub(crate) const TEST_PID: u32 = 1000;

/// Probe that reports a fixed set of pids as running.
pub(crate) struct ScriptedProbe {
    running: HashSet<u32>,
}

impl ScriptedProbe {
    pub(crate) fn running(pids: &[u32]) -> Self {
        Self {
            running: pids.iter().copied().collect(),
        }
    }
}

impl ProcessProbe for ScriptedProbe {
    fn is_running(&self, pid: u32) -> bool {
        self.running.contains(&pid)
    }
}

pub(crate) fn test_identity(hostname: &str, pid: u32) -> HostIdentity {
    HostIdentity {
        hostname: hostname.to_string(),
        pid,
        username: Some("tester".to_string()),
        uid: Some(1000),
        gid: Some(1000),
    }
}

/// Locker on `TEST_HOST` as `TEST_PID`, where only `TEST_PID` is running.
pub(crate) fn test_locker(backend: Arc<dyn Backend>) -> Locker {
    Locker::new(backend, &Config::default())
        .unwrap()
        .with_identity(test_identity(TEST_HOST, TEST_PID))
        .with_probe(Arc::new(ScriptedProbe::running(&[TEST_PID])))
}

/// Store a record directly, bypassing the protocol.
pub(crate) fn create_fake_lock(
    backend: &dyn Backend,
    time: DateTime<Utc>,
    pid: u32,
    hostname: &str,
    exclusive: bool,
) -> Id {
    let record = LockRecord::new(&test_identity(hostname, pid), exclusive, time);
    backend::save_json(backend, FileType::Lock, &record).unwrap()
}

pub(crate) fn lock_exists(backend: &dyn Backend, id: Id) -> bool {
    backend
        .exists(&ObjectHandle::new(FileType::Lock, id))
        .unwrap()
}

pub(crate) fn lock_ids(backend: &dyn Backend) -> Vec<Id> {
    let mut ids = Vec::new();
    backend
        .list(FileType::Lock, &mut |id, _| {
            ids.push(id);
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
    ids
}

/// Memory backend whose operations can be made to fail on demand.
#[derive(Default)]
pub(crate) struct FaultyBackend {
    inner: MemoryBackend,
    pub(crate) fail_list: AtomicBool,
    pub(crate) fail_load: AtomicBool,
    pub(crate) fail_save: AtomicBool,
    pub(crate) fail_remove: AtomicBool,
}

impl FaultyBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(LockError::Backend(format!("injected {} failure", op)))
        } else {
            Ok(())
        }
    }
}

impl Backend for FaultyBackend {
    fn save(&self, handle: &ObjectHandle, data: &[u8]) -> Result<()> {
        Self::check(&self.fail_save, "save")?;
        self.inner.save(handle, data)
    }

    fn load(&self, handle: &ObjectHandle) -> Result<Vec<u8>> {
        Self::check(&self.fail_load, "load")?;
        self.inner.load(handle)
    }

    fn remove(&self, handle: &ObjectHandle) -> Result<()> {
        Self::check(&self.fail_remove, "remove")?;
        self.inner.remove(handle)
    }

    fn exists(&self, handle: &ObjectHandle) -> Result<bool> {
        self.inner.exists(handle)
    }

    fn list(&self, kind: FileType, visit: &mut ListVisitor<'_>) -> Result<()> {
        Self::check(&self.fail_list, "list")?;
        self.inner.list(kind, visit)
    }
}
