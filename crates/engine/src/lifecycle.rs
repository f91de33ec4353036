//! Status derivation: one well-defined lifecycle status per job.
//!
//! A [`JobLifecycleState`] is purely derived. It is never hand-constructed
//! or persisted independently of its inputs; every new batch of responses
//! recomputes it from scratch. That makes late arrivals self-correcting:
//! a result that lands after an `error` feedback simply produces
//! `Completed` on the next derivation.

use tracing::debug;

use dvmdesk_core::{Pubkey, RawRecord};

use crate::codec::{decode_job_feedback, decode_job_result};
use crate::correlate::{JobResponse, ResponseKind};
use crate::types::{FeedbackStatus, JobFeedback, JobResult, JobStatus};

/// The engine's computed view of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLifecycleState {
    pub request: RawRecord,
    /// Results seen so far, in fetch order.
    pub results: Vec<JobResult>,
    /// Feedback seen so far, ordered by source timestamp ascending.
    pub feedback: Vec<JobFeedback>,
    pub status: JobStatus,
    /// The identity currently answering, if any response exists.
    pub provider: Option<Pubkey>,
}

impl JobLifecycleState {
    /// Derive the state for one request from its accumulated responses.
    ///
    /// Malformed responses are skipped, never fatal. Status rules, in
    /// priority order:
    ///
    /// 1. any result ⇒ `Completed`, upgraded to `Success` when the latest
    ///    feedback explicitly reports success;
    /// 2. else the latest feedback's status;
    /// 3. else `Pending`.
    pub fn derive(request: &RawRecord, responses: &[JobResponse]) -> Self {
        let mut results = Vec::new();
        let mut feedback = Vec::new();
        let mut skipped = 0usize;

        for response in responses {
            match response.kind {
                ResponseKind::Result => match decode_job_result(&response.record) {
                    Some(result) => results.push(result),
                    None => skipped += 1,
                },
                ResponseKind::Feedback => match decode_job_feedback(&response.record) {
                    Some(item) => feedback.push(item),
                    None => skipped += 1,
                },
            }
        }
        if skipped > 0 {
            debug!(request = %request.id, skipped, "skipped malformed responses");
        }
        feedback.sort_by_key(|f| f.record.created_at);

        let latest_feedback = feedback.last();
        let status = if !results.is_empty() {
            match latest_feedback.map(|f| f.status) {
                Some(FeedbackStatus::Success) => JobStatus::Success,
                _ => JobStatus::Completed,
            }
        } else if let Some(latest) = latest_feedback {
            latest.status.into()
        } else {
            JobStatus::Pending
        };

        let provider = results
            .first()
            .map(|r| r.record.pubkey.clone())
            .or_else(|| latest_feedback.map(|f| f.record.pubkey.clone()));

        Self {
            request: request.clone(),
            results,
            feedback,
            status,
            provider,
        }
    }

    /// Derive directly from raw records, classifying as it goes.
    pub fn derive_from_records(request: &RawRecord, records: &[RawRecord]) -> Self {
        let responses: Vec<JobResponse> =
            records.iter().filter_map(JobResponse::classify).collect();
        Self::derive(request, &responses)
    }

    /// Whether this job is still worth polling for.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvmdesk_core::EventId;

    fn request() -> RawRecord {
        RawRecord {
            id: EventId::new("01".repeat(32)),
            kind: 5001,
            pubkey: Pubkey::new("aa".repeat(32)),
            created_at: 1000,
            content: "summarize".to_owned(),
            tags: vec![],
        }
    }

    fn feedback(n: u8, status: &str, created_at: i64) -> RawRecord {
        RawRecord {
            id: EventId::new(format!("{n:02x}").repeat(32)),
            kind: 7000,
            pubkey: Pubkey::new("bb".repeat(32)),
            created_at,
            content: String::new(),
            tags: vec![
                vec!["status".to_owned(), status.to_owned()],
                vec!["e".to_owned(), request().id.to_string()],
            ],
        }
    }

    fn result(n: u8, created_at: i64) -> RawRecord {
        let embedded = serde_json::to_string(&request()).unwrap();
        RawRecord {
            id: EventId::new(format!("{n:02x}").repeat(32)),
            kind: 6001,
            pubkey: Pubkey::new("cc".repeat(32)),
            created_at,
            content: "output".to_owned(),
            tags: vec![
                vec!["request".to_owned(), embedded],
                vec!["e".to_owned(), request().id.to_string()],
            ],
        }
    }

    #[test]
    fn no_responses_is_pending() {
        let state = JobLifecycleState::derive_from_records(&request(), &[]);
        assert_eq!(state.status, JobStatus::Pending);
        assert_eq!(state.provider, None);
        assert!(state.is_active());
    }

    #[test]
    fn status_follows_latest_feedback_then_result() {
        let req = request();

        let batch = vec![feedback(2, "processing", 1010)];
        let state = JobLifecycleState::derive_from_records(&req, &batch);
        assert_eq!(state.status, JobStatus::Processing);

        let batch = vec![feedback(2, "processing", 1010), feedback(3, "payment-required", 1020)];
        let state = JobLifecycleState::derive_from_records(&req, &batch);
        assert_eq!(state.status, JobStatus::PaymentRequired);

        let batch = vec![
            feedback(2, "processing", 1010),
            feedback(3, "payment-required", 1020),
            result(4, 1030),
        ];
        let state = JobLifecycleState::derive_from_records(&req, &batch);
        assert_eq!(state.status, JobStatus::Completed);

        let batch = vec![
            feedback(2, "processing", 1010),
            result(4, 1030),
            feedback(5, "success", 1040),
        ];
        let state = JobLifecycleState::derive_from_records(&req, &batch);
        assert_eq!(state.status, JobStatus::Success);
    }

    #[test]
    fn feedback_order_is_chronological_not_fetch_order() {
        let batch = vec![feedback(3, "error", 1040), feedback(2, "processing", 1010)];
        let state = JobLifecycleState::derive_from_records(&request(), &batch);
        assert_eq!(state.status, JobStatus::Error);
        assert_eq!(state.feedback[0].status, FeedbackStatus::Processing);
    }

    #[test]
    fn late_result_overrides_error_feedback() {
        let batch = vec![feedback(2, "error", 1010), result(3, 1005)];
        let state = JobLifecycleState::derive_from_records(&request(), &batch);
        assert_eq!(state.status, JobStatus::Completed);
        assert!(state.status.is_terminal());
    }

    #[test]
    fn completion_does_not_regress_with_more_feedback() {
        let mut batch = vec![result(3, 1030)];
        let state = JobLifecycleState::derive_from_records(&request(), &batch);
        assert_eq!(state.status, JobStatus::Completed);

        batch.push(feedback(4, "processing", 1050));
        let state = JobLifecycleState::derive_from_records(&request(), &batch);
        assert_ne!(state.status, JobStatus::Pending);
        assert_eq!(state.status, JobStatus::Completed);
    }

    #[test]
    fn provider_prefers_result_author() {
        let batch = vec![feedback(2, "processing", 1010), result(3, 1030)];
        let state = JobLifecycleState::derive_from_records(&request(), &batch);
        assert_eq!(state.provider, Some(Pubkey::new("cc".repeat(32))));

        let batch = vec![feedback(2, "processing", 1010)];
        let state = JobLifecycleState::derive_from_records(&request(), &batch);
        assert_eq!(state.provider, Some(Pubkey::new("bb".repeat(32))));
    }

    #[test]
    fn malformed_responses_are_skipped() {
        let bad = RawRecord {
            id: EventId::new("ee".repeat(32)),
            kind: 7000,
            pubkey: Pubkey::new("bb".repeat(32)),
            created_at: 1010,
            content: String::new(),
            tags: vec![],
        };
        let state = JobLifecycleState::derive_from_records(&request(), &[bad]);
        assert_eq!(state.status, JobStatus::Pending);
        assert!(state.feedback.is_empty());
    }
}
