//! Poll one job until its lifecycle reaches a terminal status.
//!
//! The polling policy itself is pure and lives in the engine; this is the
//! scheduling loop around it. A failed fetch is logged and retried on the
//! next tick, never within the same tick.

use tracing::{debug, warn};

use dvmdesk_core::RawRecord;
use dvmdesk_engine::{JobLifecycleState, PollScope, next_poll_delay};

use crate::service::JobService;
use crate::transport::{Cancel, Transport, TransportError};

/// Re-fetch `request`'s state on the job-detail cadence until the derived
/// status is terminal, returning the final state.
///
/// Cancellation aborts the loop, including mid-sleep.
pub async fn watch_job<T: Transport>(
    service: &JobService<T>,
    request: &RawRecord,
    cancel: &Cancel,
) -> Result<JobLifecycleState, TransportError> {
    loop {
        let delay = match service.job_state(request, cancel).await {
            Ok(state) => match next_poll_delay(state.status, PollScope::JobDetail) {
                None => {
                    debug!(request = %request.id, status = %state.status, "job reached terminal status");
                    return Ok(state);
                }
                Some(delay) => delay,
            },
            Err(TransportError::Cancelled) => return Err(TransportError::Cancelled),
            Err(err) => {
                warn!(request = %request.id, error = %err, "job state fetch failed; retrying next tick");
                PollScope::JobDetail.interval()
            }
        };

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = cancel.cancelled() => return Err(TransportError::Cancelled),
        }
    }
}
