//! Staleness evaluation.
//!
//! A lock is stale when it has not been refreshed within the stale timeout,
//! or when it was created on this machine by a process that no longer runs.
//! The age rule is checked first because it works for every host; the
//! process rule is only possible for records created locally.

use super::record::LockRecord;
use crate::config::Config;
use crate::process::ProcessProbe;
use chrono::{DateTime, Duration, Utc};

/// Thresholds used to judge lock records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalePolicy {
    /// Age past which a record is stale on every host.
    pub stale_timeout: Duration,
    /// How far in the future a timestamp may lie before it counts as skewed.
    pub clock_skew: Duration,
}

impl StalePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            stale_timeout: config.stale_timeout(),
            clock_skew: config.clock_skew(),
        }
    }
}

impl Default for StalePolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Decide whether `record` is abandoned, as seen from `observer_hostname` at `now`.
///
/// Future timestamps never make a record stale by age, no matter how far
/// ahead they are: a skewed clock must not free someone else's lock.
pub fn is_stale(
    record: &LockRecord,
    observer_hostname: &str,
    now: DateTime<Utc>,
    policy: &StalePolicy,
    probe: &dyn ProcessProbe,
) -> bool {
    if record.age(now) > policy.stale_timeout {
        return true;
    }

    // Liveness of remote processes cannot be checked.
    if record.hostname != observer_hostname {
        return false;
    }

    !probe.is_running(record.pid)
}

/// Whether the record's timestamp lies further in the future than the skew allowance.
pub fn is_future_dated(record: &LockRecord, now: DateTime<Utc>, policy: &StalePolicy) -> bool {
    -record.age(now) > policy.clock_skew
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedProbe, test_identity};

    const HOST: &str = "host-a";
    const LIVE_PID: u32 = 1000;
    const DEAD_PID: u32 = 501_000;

    fn record_at(time: DateTime<Utc>, pid: u32, hostname: &str) -> LockRecord {
        let mut identity = test_identity(hostname, pid);
        identity.username = None;
        LockRecord::new(&identity, false, time)
    }

    struct Case {
        offset: Duration,
        pid: u32,
        stale: bool,
        stale_on_other_host: bool,
    }

    #[test]
    fn stale_table() {
        let now = Utc::now();
        let policy = StalePolicy::default();
        let probe = ScriptedProbe::running(&[LIVE_PID]);

        let cases = [
            Case {
                offset: Duration::zero(),
                pid: LIVE_PID,
                stale: false,
                stale_on_other_host: false,
            },
            Case {
                offset: -Duration::hours(1),
                pid: LIVE_PID,
                stale: true,
                stale_on_other_host: true,
            },
            Case {
                offset: Duration::minutes(3),
                pid: LIVE_PID,
                stale: false,
                stale_on_other_host: false,
            },
            Case {
                offset: Duration::zero(),
                pid: DEAD_PID,
                stale: true,
                stale_on_other_host: false,
            },
        ];

        for (i, case) in cases.iter().enumerate() {
            let mut record = record_at(now + case.offset, case.pid, HOST);
            assert_eq!(
                is_stale(&record, HOST, now, &policy, &probe),
                case.stale,
                "case {} on own host",
                i
            );

            record.hostname = format!("other-{}", HOST);
            assert_eq!(
                is_stale(&record, HOST, now, &policy, &probe),
                case.stale_on_other_host,
                "case {} on other host",
                i
            );
        }
    }

    #[test]
    fn staleness_is_monotonic_in_elapsed_time() {
        let now = Utc::now();
        let policy = StalePolicy::default();
        let probe = ScriptedProbe::running(&[LIVE_PID]);
        let record = record_at(now - Duration::minutes(31), LIVE_PID, "elsewhere");

        for minutes in [0, 1, 10, 60, 60 * 24 * 365] {
            let later = now + Duration::minutes(minutes);
            assert!(is_stale(&record, HOST, later, &policy, &probe));
        }
    }

    #[test]
    fn threshold_boundary_is_exclusive() {
        let now = Utc::now();
        let policy = StalePolicy::default();
        let probe = ScriptedProbe::running(&[LIVE_PID]);

        let at_limit = record_at(now - policy.stale_timeout, LIVE_PID, "elsewhere");
        assert!(!is_stale(&at_limit, HOST, now, &policy, &probe));

        let past_limit = record_at(
            now - policy.stale_timeout - Duration::seconds(1),
            LIVE_PID,
            "elsewhere",
        );
        assert!(is_stale(&past_limit, HOST, now, &policy, &probe));
    }

    #[test]
    fn far_future_records_are_kept_but_flagged() {
        let now = Utc::now();
        let policy = StalePolicy::default();
        let probe = ScriptedProbe::running(&[LIVE_PID]);

        let skewed = record_at(now + Duration::days(2), LIVE_PID, "elsewhere");
        assert!(!is_stale(&skewed, HOST, now, &policy, &probe));
        assert!(is_future_dated(&skewed, now, &policy));

        let slightly_ahead = record_at(now + Duration::minutes(3), LIVE_PID, "elsewhere");
        assert!(!is_future_dated(&slightly_ahead, now, &policy));
    }

    #[test]
    fn custom_timeout_from_config() {
        let config = Config {
            stale_timeout_minutes: 10,
            refresh_interval_minutes: 2,
            ..Config::default()
        };
        let policy = StalePolicy::from_config(&config);
        let probe = ScriptedProbe::running(&[LIVE_PID]);
        let now = Utc::now();

        let record = record_at(now - Duration::minutes(11), LIVE_PID, "elsewhere");
        assert!(is_stale(&record, HOST, now, &policy, &probe));
        assert!(!is_stale(&record, HOST, now, &StalePolicy::default(), &probe));
    }
}
