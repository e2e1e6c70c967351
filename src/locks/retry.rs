//! Waiting for a locked repository.

use super::handle::LockHandle;
use super::operations::Locker;
use crate::error::Result;
use std::time::{Duration, Instant};
use tracing::info;

const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);
const CANCEL_POLL: Duration = Duration::from_millis(100);

impl Locker {
    /// Acquire a lock, retrying for up to `retry_for` while the repository is locked.
    ///
    /// Only `AlreadyLocked` is retried; every other error is returned at once.
    /// The delay between attempts starts at one second and doubles up to a
    /// minute. When time runs out the last `AlreadyLocked` error is returned.
    /// A budget too large to represent as a deadline retries until cancelled.
    pub fn acquire_with_retry(&self, exclusive: bool, retry_for: Duration) -> Result<LockHandle> {
        let deadline = Instant::now().checked_add(retry_for);
        let mut delay = INITIAL_RETRY_DELAY;

        loop {
            match self.acquire(exclusive) {
                Err(e) if e.is_already_locked() && before(deadline) => {
                    let wait = match deadline {
                        Some(deadline) => {
                            delay.min(deadline.saturating_duration_since(Instant::now()))
                        }
                        None => delay,
                    };
                    info!(error = %e, "repository is locked, retrying in {:?}", wait);
                    self.sleep(wait)?;
                    delay = (delay * 2).min(MAX_RETRY_DELAY);
                }
                result => return result,
            }
        }
    }

    /// Sleep for `duration`, waking early with `Cancelled` if the token fires.
    fn sleep(&self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        loop {
            self.cancel.check()?;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }
            std::thread::sleep(remaining.min(CANCEL_POLL));
        }
    }
}

fn before(deadline: Option<Instant>) -> bool {
    deadline.is_none_or(|deadline| Instant::now() < deadline)
}
