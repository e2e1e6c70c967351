//! Atomic filesystem writes for the local backend.
//!
//! All writes follow this pattern:
//! 1. Write content to a uniquely named temporary file in the same directory
//! 2. Sync the file to disk (fsync)
//! 3. Rename it over the target path
//!
//! `rename()` is atomic when source and destination share a filesystem, which
//! holds because the temporary file lives next to the target. Temporary files
//! start with a dot so directory listings can skip them; a crash may leave one
//! behind (named `.{filename}.{pid}-{n}.tmp`).

use crate::error::{LockError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Atomically write bytes to a file.
///
/// The parent directory is created if it does not exist. The target file is
/// never visible in a partial state.
///
/// # Example
///
/// ```no_run
/// use repolock::fs::atomic_write;
/// use std::path::Path;
///
/// atomic_write(Path::new("locks/0a1b2c"), b"{}")?;
/// # Ok::<(), repolock::error::LockError>(())
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            LockError::Backend(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = generate_temp_path(path)?;
    write_and_sync(&temp_path, content)?;
    atomic_replace(&temp_path, path)
}

/// Generate a temporary file path in the same directory as the target.
///
/// The name carries the process id and a per-process counter, so two writers
/// (in this process or another one) never share a temporary file.
fn generate_temp_path(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            LockError::Backend(format!("invalid object path '{}'", target.display()))
        })?;

    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_name = format!(".{}.{}-{}.tmp", filename, std::process::id(), n);
    Ok(parent.join(temp_name))
}

/// Write content to a file and sync to disk.
fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        LockError::Backend(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        LockError::Backend(format!("failed to write to temporary file: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        LockError::Backend(format!("failed to sync temporary file to disk: {}", e))
    })?;

    Ok(())
}

/// Rename the temporary file over the target and sync the directory entry.
fn atomic_replace(source: &Path, target: &Path) -> Result<()> {
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        LockError::Backend(format!(
            "failed to atomically replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    // Opening a directory fails on some platforms; durability is best effort there.
    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("object");

        atomic_write(&file_path, b"hello world").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "hello world");
    }

    #[test]
    fn test_atomic_write_replace_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("object");

        fs::write(&file_path, "original content").unwrap();
        atomic_write(&file_path, b"new content").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "new content");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("locks").join("abc");

        atomic_write(&file_path, b"nested content").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "nested content");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("object");

        atomic_write(&file_path, b"content").unwrap();

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["object".to_string()]);
    }

    #[test]
    fn test_generate_temp_path_is_unique_and_hidden() {
        let target = Path::new("/some/path/object");
        let a = generate_temp_path(target).unwrap();
        let b = generate_temp_path(target).unwrap();

        assert_ne!(a, b);
        assert_eq!(a.parent().unwrap(), Path::new("/some/path"));
        let name = a.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with('.'));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn test_atomic_write_concurrent_same_target() {
        // Content-addressed objects may be written by several writers at once;
        // every writer must succeed and the content must be complete.
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("shared");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || atomic_write(&path, b"same content"))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(fs::read(&path).unwrap(), b"same content");
    }
}
