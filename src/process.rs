//! Local host and process inspection.
//!
//! Liveness can only be checked for processes on this machine. Everything
//! here is best effort: when the platform gives no answer we report a process
//! as running, so an unknown state keeps a lock alive until it ages out.

use crate::error::{LockError, Result};

/// Answers whether a process id is currently running on this machine.
pub trait ProcessProbe: Send + Sync {
    fn is_running(&self, pid: u32) -> bool;
}

/// Probe backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProcessProbe;

impl ProcessProbe for LocalProcessProbe {
    fn is_running(&self, pid: u32) -> bool {
        is_process_running(pid)
    }
}

/// Check whether a process with the given PID exists.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    // pid 0 and values that do not fit a pid_t would address process groups.
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }

    // kill(pid, 0) delivers nothing; it only checks that the target exists.
    let rc = unsafe { libc::kill(pid, 0) };
    if rc == 0 {
        return true;
    }

    // EPERM: the process exists but belongs to someone else.
    matches!(
        std::io::Error::last_os_error().raw_os_error(),
        Some(code) if code == libc::EPERM
    )
}

/// Check whether a process with the given PID exists.
#[cfg(not(unix))]
pub fn is_process_running(_pid: u32) -> bool {
    true
}

/// Who is taking a lock: this machine and this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub hostname: String,
    pub pid: u32,
    pub username: Option<String>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

impl HostIdentity {
    /// Identity of the running process.
    ///
    /// Fails when the hostname cannot be determined: without it, records we
    /// create could never be matched for the local liveness check.
    pub fn current() -> Result<Self> {
        let hostname = hostname::get()
            .map_err(|e| LockError::Config(format!("failed to determine hostname: {}", e)))?
            .to_string_lossy()
            .to_string();

        let (uid, gid) = current_ids();

        Ok(Self {
            hostname,
            pid: std::process::id(),
            username: current_username(),
            uid,
            gid,
        })
    }
}

fn current_username() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|name| !name.is_empty())
}

#[cfg(unix)]
fn current_ids() -> (Option<u32>, Option<u32>) {
    let uid = unsafe { libc::getuid() };
    let gid = unsafe { libc::getgid() };
    (Some(uid), Some(gid))
}

#[cfg(not(unix))]
fn current_ids() -> (Option<u32>, Option<u32>) {
    (None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_process_is_running() {
        assert!(is_process_running(std::process::id()));
        assert!(LocalProcessProbe.is_running(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn absent_process_is_not_running() {
        // Far above any kernel pid_max.
        assert!(!is_process_running(999_999_999));
    }

    #[cfg(unix)]
    #[test]
    fn group_addressing_pids_are_rejected() {
        assert!(!is_process_running(0));
        assert!(!is_process_running(u32::MAX));
    }

    #[test]
    fn current_identity_has_hostname_and_pid() {
        let me = HostIdentity::current().unwrap();
        assert!(!me.hostname.is_empty());
        assert_eq!(me.pid, std::process::id());
    }
}
