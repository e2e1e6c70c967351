//! Background refresh of a held lock.

use super::handle::LockHandle;
use crate::backend::Id;
use crate::error::{LockError, Result};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Keeps a lock alive by refreshing it on a background thread.
///
/// The refresh interval must be well below the stale timeout, otherwise
/// another process may sweep the lock between two refreshes. Refresh errors
/// are logged and retried at the next tick; the thread stops for good once
/// the lock turns out to be gone.
///
/// Dropping the keeper stops the thread and then releases the lock.
pub struct LockKeeper {
    handle: Arc<Mutex<LockHandle>>,
    stop: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl LockKeeper {
    pub fn start(handle: LockHandle, interval: Duration) -> Self {
        let handle = Arc::new(Mutex::new(handle));
        let (stop, stop_rx) = mpsc::channel();

        let shared = Arc::clone(&handle);
        let worker = thread::spawn(move || refresh_loop(&shared, &stop_rx, interval));

        Self {
            handle,
            stop: Some(stop),
            worker: Some(worker),
        }
    }

    /// Storage id of the record currently backing the lock.
    pub fn id(&self) -> Id {
        lock(&self.handle).id()
    }

    /// False once the lock was found removed by another process.
    pub fn is_held(&self) -> bool {
        !lock(&self.handle).is_released()
    }

    /// Stop refreshing and release the lock.
    pub fn release(mut self) -> Result<()> {
        self.stop_worker();
        lock(&self.handle).release()
    }

    fn stop_worker(&mut self) {
        // Dropping the sender wakes the worker immediately.
        self.stop.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("lock refresh thread panicked");
        }
    }
}

impl Drop for LockKeeper {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn lock(handle: &Mutex<LockHandle>) -> MutexGuard<'_, LockHandle> {
    handle.lock().unwrap_or_else(|poison| poison.into_inner())
}

fn refresh_loop(handle: &Mutex<LockHandle>, stop: &mpsc::Receiver<()>, interval: Duration) {
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }

        let mut guard = lock(handle);
        match guard.refresh() {
            Ok(()) => debug!(lock = %guard.id().short(), "lock refreshed"),
            Err(e) if e.is_not_locked() => {
                warn!(error = %e, "lock lost, no longer refreshing");
                return;
            }
            Err(LockError::Cancelled) => return,
            Err(e) => warn!(error = %e, "failed to refresh lock, retrying at next interval"),
        }
    }
}
