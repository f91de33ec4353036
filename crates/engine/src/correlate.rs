//! Correlation of responses back to their originating requests.
//!
//! Requester-centric views ("what happened to my request") and
//! provider-centric views ("what has this identity answered lately") are
//! fetched independently, so requests and responses arrive as two
//! unrelated batches that must be stitched together after the fact. A
//! response names its request through a reference tag; the index groups
//! on that value and reports references it cannot resolve locally so the
//! caller can issue one backfill point query.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use dvmdesk_core::kinds::{is_feedback_kind, is_result_kind};
use dvmdesk_core::{EventId, RawRecord};

/// Which side of the result/feedback split a response falls on.
///
/// Correlation treats both uniformly; status derivation does not.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Result,
    Feedback,
}

/// A raw response record, classified but not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResponse {
    pub record: RawRecord,
    pub kind: ResponseKind,
}

impl JobResponse {
    /// Classify a record as a response, or `None` for non-response kinds.
    pub fn classify(record: &RawRecord) -> Option<Self> {
        let kind = if is_result_kind(record.kind) {
            ResponseKind::Result
        } else if is_feedback_kind(record.kind) {
            ResponseKind::Feedback
        } else {
            return None;
        };
        Some(Self {
            record: record.clone(),
            kind,
        })
    }

    /// The request this response claims to answer: the first reference
    /// (`e`) tag value. Trusted at face value; the protocol does not bind
    /// a response to a legitimate invitation.
    pub fn referenced_request_id(&self) -> Option<EventId> {
        self.record.first_tag("e")?.get(1)?.parse().ok()
    }
}

/// One request together with every response that references it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobGroup {
    pub request: RawRecord,
    pub responses: Vec<JobResponse>,
}

/// Request-id → response-set mapping over one fetched snapshot.
///
/// Owns the grouping for the lifetime of one query cycle; the next poll
/// rebuilds from scratch.
#[derive(Debug, Default)]
pub struct CorrelationIndex {
    groups: HashMap<EventId, JobGroup>,
    /// Responses whose reference is absent locally (or missing entirely).
    /// Retained so a later backfill can still attach them.
    unmatched: Vec<JobResponse>,
    seen: HashSet<EventId>,
}

impl CorrelationIndex {
    /// Build the index in a single pass over the responses.
    ///
    /// Records that are not responses (wrong kind) are ignored. Duplicate
    /// records, which relays are free to return, merge idempotently on
    /// record id.
    pub fn build(requests: &[RawRecord], responses: &[RawRecord]) -> Self {
        let mut index = Self::default();
        for request in requests {
            index
                .groups
                .entry(request.id.clone())
                .or_insert_with(|| JobGroup {
                    request: request.clone(),
                    responses: Vec::new(),
                });
        }
        for record in responses {
            if let Some(response) = JobResponse::classify(record) {
                index.attach(response);
            }
        }
        debug!(
            groups = index.groups.len(),
            unmatched = index.unmatched.len(),
            "correlation index built"
        );
        index
    }

    fn attach(&mut self, response: JobResponse) {
        if !self.seen.insert(response.record.id.clone()) {
            return;
        }
        match response.referenced_request_id() {
            Some(id) if self.groups.contains_key(&id) => {
                if let Some(group) = self.groups.get_mut(&id) {
                    group.responses.push(response);
                }
            }
            _ => self.unmatched.push(response),
        }
    }

    /// Distinct referenced request ids with no local request record.
    ///
    /// The caller should fetch exactly these ids and hand the records to
    /// [`absorb_requests`](Self::absorb_requests).
    pub fn needs_backfill(&self) -> Vec<EventId> {
        let mut ids = Vec::new();
        let mut distinct = HashSet::new();
        for response in &self.unmatched {
            if let Some(id) = response.referenced_request_id()
                && !self.groups.contains_key(&id)
                && distinct.insert(id.clone())
            {
                ids.push(id);
            }
        }
        ids
    }

    /// Second pass: add late-fetched request records and re-attach any
    /// retained responses that reference them.
    pub fn absorb_requests(&mut self, requests: &[RawRecord]) {
        for request in requests {
            self.groups
                .entry(request.id.clone())
                .or_insert_with(|| JobGroup {
                    request: request.clone(),
                    responses: Vec::new(),
                });
        }
        let pending = std::mem::take(&mut self.unmatched);
        self.seen
            .retain(|id| !pending.iter().any(|r| &r.record.id == id));
        for response in pending {
            self.attach(response);
        }
    }

    /// All groups, most recently created request first.
    pub fn groups(&self) -> Vec<&JobGroup> {
        let mut groups: Vec<&JobGroup> = self.groups.values().collect();
        groups.sort_by(|a, b| b.request.created_at.cmp(&a.request.created_at));
        groups
    }

    /// The group for one request id, if known.
    pub fn group(&self, request_id: &EventId) -> Option<&JobGroup> {
        self.groups.get(request_id)
    }

    /// Responses that reference nothing resolvable. Never surfaced as an
    /// error; excluded from every lifecycle view.
    pub fn unmatched(&self) -> &[JobResponse] {
        &self.unmatched
    }
}
