//! Polling policy: whether and how soon to re-query for a job.
//!
//! Pure decision function; the scheduling loop lives with the caller.

use std::time::Duration;

use crate::types::JobStatus;

/// Granularity being polled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PollScope {
    /// A single job's detail view.
    JobDetail,
    /// The aggregate list of all active jobs.
    ActiveList,
}

impl PollScope {
    /// The fixed re-query interval for this scope.
    pub fn interval(&self) -> Duration {
        match self {
            PollScope::JobDetail => Duration::from_secs(5),
            PollScope::ActiveList => Duration::from_secs(10),
        }
    }
}

/// How long to wait before the next poll, or `None` to stop.
///
/// Terminal statuses stop polling but stay recomputable: if a late record
/// shows up through some other fetch, derivation still picks it up.
pub fn next_poll_delay(status: JobStatus, scope: PollScope) -> Option<Duration> {
    status.is_active().then(|| scope.interval())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_statuses_keep_polling() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::PaymentRequired,
            JobStatus::Partial,
        ] {
            assert_eq!(
                next_poll_delay(status, PollScope::JobDetail),
                Some(Duration::from_secs(5))
            );
            assert_eq!(
                next_poll_delay(status, PollScope::ActiveList),
                Some(Duration::from_secs(10))
            );
        }
    }

    #[test]
    fn terminal_statuses_stop_polling() {
        for status in [JobStatus::Error, JobStatus::Success, JobStatus::Completed] {
            assert_eq!(next_poll_delay(status, PollScope::JobDetail), None);
            assert_eq!(next_poll_delay(status, PollScope::ActiveList), None);
        }
    }
}
