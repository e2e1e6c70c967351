//! In-memory backend.

use super::{Backend, FileType, Id, ListVisitor, ObjectHandle};
use crate::error::{LockError, Result};
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::{Mutex, MutexGuard};

/// Backend keeping every object in a process-local map.
///
/// Useful for tests and for embedding the lock protocol where the repository
/// lives in memory. Cloning is not supported; share it through an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: Mutex<BTreeMap<(FileType, Id), Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<(FileType, Id), Vec<u8>>> {
        // A panicking visitor cannot leave the map half-updated.
        self.objects
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl Backend for MemoryBackend {
    fn save(&self, handle: &ObjectHandle, data: &[u8]) -> Result<()> {
        self.objects()
            .insert((handle.kind, handle.id), data.to_vec());
        Ok(())
    }

    fn load(&self, handle: &ObjectHandle) -> Result<Vec<u8>> {
        self.objects()
            .get(&(handle.kind, handle.id))
            .cloned()
            .ok_or_else(|| LockError::NotFound(handle.to_string()))
    }

    fn remove(&self, handle: &ObjectHandle) -> Result<()> {
        self.objects()
            .remove(&(handle.kind, handle.id))
            .map(|_| ())
            .ok_or_else(|| LockError::NotFound(handle.to_string()))
    }

    fn exists(&self, handle: &ObjectHandle) -> Result<bool> {
        Ok(self.objects().contains_key(&(handle.kind, handle.id)))
    }

    fn list(&self, kind: FileType, visit: &mut ListVisitor<'_>) -> Result<()> {
        // Snapshot first so the visitor may call back into the backend.
        let entries: Vec<(Id, u64)> = self
            .objects()
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|((_, id), data)| (*id, data.len() as u64))
            .collect();

        for (id, size) in entries {
            if let ControlFlow::Break(()) = visit(id, size)? {
                break;
            }
        }
        Ok(())
    }
}
