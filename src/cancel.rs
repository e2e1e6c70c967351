//! Cooperative cancellation for lock operations.

use crate::error::{LockError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable flag shared between a caller and the operations it started.
///
/// Lock operations check the token before every backend call and between
/// listed records. A cancelled operation fails with [`LockError::Cancelled`];
/// a record it already persisted stays behind until it goes stale.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called on any clone.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(LockError::Cancelled)
        } else {
            Ok(())
        }
    }
}
