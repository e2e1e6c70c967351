//! Object-storage backend seam.
//!
//! The lock protocol only needs five primitives from storage: save, list,
//! load, remove and an existence test. [`Backend`] captures exactly those;
//! nothing here offers compare-and-swap or any other atomic multi-object
//! operation, and the protocol above must not assume one.
//!
//! Objects are content addressed: [`save_json`] serializes a value, names it
//! by the SHA-256 of those bytes and stores it. [`load_json`] verifies the
//! hash on the way back in.

mod id;
mod local;
mod memory;

pub use id::Id;
pub use local::LocalBackend;
pub use memory::MemoryBackend;

use crate::error::{LockError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::ops::ControlFlow;

/// Kind of stored object. Each kind lives in its own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum FileType {
    /// Lock records.
    Lock,
}

impl FileType {
    /// Directory (or key prefix) that holds objects of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Lock => "locks",
        }
    }
}

/// Names one stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    pub kind: FileType,
    pub id: Id,
}

impl ObjectHandle {
    pub fn new(kind: FileType, id: Id) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.id)
    }
}

/// Callback invoked once per listed object with its id and size in bytes.
pub type ListVisitor<'a> = dyn FnMut(Id, u64) -> Result<ControlFlow<()>> + 'a;

/// Storage primitives consumed by the lock protocol.
///
/// Implementations must be safe to call from several threads at once.
/// Missing objects are reported as [`LockError::NotFound`]; every other
/// failure as [`LockError::Backend`].
pub trait Backend: Send + Sync {
    /// Store `data` under `handle`. Saving identical content twice is harmless.
    fn save(&self, handle: &ObjectHandle, data: &[u8]) -> Result<()>;

    /// Read the bytes stored under `handle`.
    fn load(&self, handle: &ObjectHandle) -> Result<Vec<u8>>;

    /// Delete the object stored under `handle`.
    fn remove(&self, handle: &ObjectHandle) -> Result<()>;

    /// Whether an object is stored under `handle`.
    fn exists(&self, handle: &ObjectHandle) -> Result<bool>;

    /// Visit every object of `kind` in unspecified order.
    ///
    /// Listing stops early when the visitor returns `Break` and aborts with
    /// the visitor's error when it returns one. The view may lag behind
    /// concurrent saves and removes.
    fn list(&self, kind: FileType, visit: &mut ListVisitor<'_>) -> Result<()>;
}

/// Serialize `value` as JSON and store it under its content address.
pub fn save_json<T: Serialize>(backend: &dyn Backend, kind: FileType, value: &T) -> Result<Id> {
    let data = serde_json::to_vec(value)
        .map_err(|e| LockError::Backend(format!("failed to serialize {}: {}", kind.as_str(), e)))?;
    let id = Id::hash(&data);
    backend.save(&ObjectHandle::new(kind, id), &data)?;
    Ok(id)
}

/// Load a JSON object and check that its content matches its id.
pub fn load_json<T: DeserializeOwned>(backend: &dyn Backend, handle: &ObjectHandle) -> Result<T> {
    let data = backend.load(handle)?;

    let actual = Id::hash(&data);
    if actual != handle.id {
        return Err(LockError::Backend(format!(
            "object {} is corrupt: content hashes to {}",
            handle, actual
        )));
    }

    serde_json::from_slice(&data)
        .map_err(|e| LockError::Backend(format!("failed to parse {}: {}", handle, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
    }

    #[test]
    fn save_json_names_object_by_content() {
        let backend = MemoryBackend::new();
        let sample = Sample {
            name: "a".to_string(),
        };

        let id = save_json(&backend, FileType::Lock, &sample).unwrap();
        assert_eq!(id, Id::hash(&serde_json::to_vec(&sample).unwrap()));

        let loaded: Sample = load_json(&backend, &ObjectHandle::new(FileType::Lock, id)).unwrap();
        assert_eq!(loaded, sample);
    }

    #[test]
    fn load_json_rejects_tampered_content() {
        let backend = MemoryBackend::new();
        let id = Id::hash(b"{\"name\":\"a\"}");
        let handle = ObjectHandle::new(FileType::Lock, id);
        backend.save(&handle, b"{\"name\":\"b\"}").unwrap();

        let err = load_json::<Sample>(&backend, &handle).unwrap_err();
        assert!(matches!(err, LockError::Backend(_)));
        assert!(err.to_string().contains("corrupt"));
    }

    #[test]
    fn load_json_reports_missing_object() {
        let backend = MemoryBackend::new();
        let handle = ObjectHandle::new(FileType::Lock, Id::hash(b"nothing"));

        let err = load_json::<Sample>(&backend, &handle).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn handle_display_includes_kind() {
        let id = Id::hash(b"x");
        let handle = ObjectHandle::new(FileType::Lock, id);
        assert_eq!(handle.to_string(), format!("locks/{}", id));
    }
}
