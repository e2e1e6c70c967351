//! Repository context resolution for the repolock CLI.
//!
//! Resolves which repository directory to operate on and which configuration
//! applies to it, then builds the backend and locker every command uses.

use crate::backend::{Backend, LocalBackend};
use crate::config::{CONFIG_FILE_NAME, Config};
use crate::error::{LockError, Result};
use crate::locks::Locker;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolved repository location and configuration.
#[derive(Debug, Clone)]
pub struct RepoContext {
    /// Absolute path to the repository root.
    pub repo_root: PathBuf,

    /// Configuration file in effect, if any.
    pub config_path: Option<PathBuf>,

    /// Loaded (or default) configuration.
    pub config: Config,
}

impl RepoContext {
    /// Resolve the context from optional command-line overrides.
    ///
    /// - The repository defaults to the current working directory.
    /// - An explicit config file must exist; otherwise `repolock.yaml` in the
    ///   repository root is used when present, and defaults when not.
    ///
    /// # Returns
    ///
    /// * `Ok(RepoContext)` - Successfully resolved context
    /// * `Err(LockError::Config)` - Missing repository or unreadable/invalid config
    pub fn resolve(repo: Option<&Path>, config: Option<&Path>) -> Result<Self> {
        let repo_root = match repo {
            Some(path) => path.to_path_buf(),
            None => env::current_dir().map_err(|e| {
                LockError::Config(format!("failed to get current working directory: {}", e))
            })?,
        };

        if !repo_root.is_dir() {
            return Err(LockError::Config(format!(
                "repository '{}' does not exist or is not a directory",
                repo_root.display()
            )));
        }

        let config_path = match config {
            Some(path) => Some(path.to_path_buf()),
            None => Some(repo_root.join(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
        };

        let config = match &config_path {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        Ok(Self {
            repo_root,
            config_path,
            config,
        })
    }

    /// Backend storing objects below the repository root.
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::new(LocalBackend::new(&self.repo_root))
    }

    /// Locker for the current process on this repository.
    pub fn locker(&self) -> Result<Locker> {
        Locker::new(self.backend(), &self.config)
    }
}
