//! Local-directory backend.
//!
//! Objects live at `<root>/<kind>/<hex id>`. Writes go through
//! [`crate::fs::atomic_write`], so listers never see a partial object.
//! Hidden files (temporary files of in-flight writes) are skipped when listing.

use super::{Backend, FileType, Id, ListVisitor, ObjectHandle};
use crate::error::{LockError, Result};
use crate::fs::atomic_write;
use std::fs;
use std::io::ErrorKind;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Backend storing objects as files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Open a repository rooted at `root`. The directory is created lazily on first save.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// The repository root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, kind: FileType) -> PathBuf {
        self.root.join(kind.as_str())
    }

    fn path(&self, handle: &ObjectHandle) -> PathBuf {
        self.dir(handle.kind).join(handle.id.to_string())
    }
}

fn io_error(op: &str, path: &Path, e: std::io::Error, handle: &ObjectHandle) -> LockError {
    if e.kind() == ErrorKind::NotFound {
        LockError::NotFound(handle.to_string())
    } else {
        LockError::Backend(format!("failed to {} '{}': {}", op, path.display(), e))
    }
}

impl Backend for LocalBackend {
    fn save(&self, handle: &ObjectHandle, data: &[u8]) -> Result<()> {
        atomic_write(self.path(handle), data)
    }

    fn load(&self, handle: &ObjectHandle) -> Result<Vec<u8>> {
        let path = self.path(handle);
        fs::read(&path).map_err(|e| io_error("read", &path, e, handle))
    }

    fn remove(&self, handle: &ObjectHandle) -> Result<()> {
        let path = self.path(handle);
        fs::remove_file(&path).map_err(|e| io_error("remove", &path, e, handle))
    }

    fn exists(&self, handle: &ObjectHandle) -> Result<bool> {
        let path = self.path(handle);
        path.try_exists().map_err(|e| {
            LockError::Backend(format!("failed to stat '{}': {}", path.display(), e))
        })
    }

    fn list(&self, kind: FileType, visit: &mut ListVisitor<'_>) -> Result<()> {
        let dir = self.dir(kind);

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            // Nothing saved yet.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(LockError::Backend(format!(
                    "failed to list '{}': {}",
                    dir.display(),
                    e
                )));
            }
        };

        for entry in entries {
            let entry = entry.map_err(|e| {
                LockError::Backend(format!("failed to read entry of '{}': {}", dir.display(), e))
            })?;

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let Ok(id) = name.parse::<Id>() else {
                debug!(file = %entry.path().display(), "skipping foreign file in object directory");
                continue;
            };

            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                // Removed between readdir and stat.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(LockError::Backend(format!(
                        "failed to stat '{}': {}",
                        entry.path().display(),
                        e
                    )));
                }
            };

            if let ControlFlow::Break(()) = visit(id, size)? {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn handle(content: &[u8]) -> ObjectHandle {
        ObjectHandle::new(FileType::Lock, Id::hash(content))
    }

    fn list_ids(backend: &LocalBackend) -> Vec<Id> {
        let mut ids = Vec::new();
        backend
            .list(FileType::Lock, &mut |id, _| {
                ids.push(id);
                Ok(ControlFlow::Continue(()))
            })
            .unwrap();
        ids
    }

    #[test]
    fn objects_are_stored_under_kind_directory() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path());
        let h = handle(b"record");

        backend.save(&h, b"record").unwrap();

        let expected = temp_dir.path().join("locks").join(h.id.to_string());
        assert!(expected.exists());
        assert_eq!(backend.load(&h).unwrap(), b"record");
        assert!(backend.exists(&h).unwrap());
    }

    #[test]
    fn list_on_fresh_repository_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path().join("repo"));

        assert!(list_ids(&backend).is_empty());
    }

    #[test]
    fn list_skips_hidden_and_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path());
        let h = handle(b"record");
        backend.save(&h, b"record").unwrap();

        let dir = temp_dir.path().join("locks");
        fs::write(dir.join(".partial.tmp"), b"junk").unwrap();
        fs::write(dir.join("README"), b"junk").unwrap();

        assert_eq!(list_ids(&backend), vec![h.id]);
    }

    #[test]
    fn missing_objects_are_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path());
        let h = handle(b"absent");

        assert!(!backend.exists(&h).unwrap());
        assert!(backend.load(&h).unwrap_err().is_not_found());
        assert!(backend.remove(&h).unwrap_err().is_not_found());
    }

    #[test]
    fn remove_deletes_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path());
        let h = handle(b"record");
        backend.save(&h, b"record").unwrap();

        backend.remove(&h).unwrap();

        assert!(!backend.exists(&h).unwrap());
        assert!(list_ids(&backend).is_empty());
    }
}
