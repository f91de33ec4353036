//! High-level fetch/submit services.
//!
//! Each method performs one bounded query cycle and hands the snapshot to
//! the engine for reconciliation. Queries for unrelated entities are
//! independent and may run concurrently; the only ordering constraint is
//! the two-pass backfill inside [`JobService::provider_jobs`], where the
//! point query depends on the first pass's unresolved references.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use dvmdesk_core::kinds::{
    PROVIDER_ANNOUNCEMENT_KIND, known_request_kinds, known_response_kinds,
};
use dvmdesk_core::{Pubkey, RawRecord};
use dvmdesk_engine::correlate::JobGroup;
use dvmdesk_engine::{
    CorrelationIndex, JobLifecycleState, JobRequest, Provider, ProviderQuery, codec,
    dedupe_providers, newest_for,
};

use crate::transport::{Cancel, Filter, Transport, TransportError, bounded_query};

/// Per-query time budgets.
///
/// Reference values: 3s for routine fetches, 5s for the two-pass
/// provider view (two dependent round-trips), 2s for single-record
/// lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTimeouts {
    pub query: Duration,
    pub backfill: Duration,
    pub lookup: Duration,
}

impl Default for ServiceTimeouts {
    fn default() -> Self {
        Self {
            query: Duration::from_secs(3),
            backfill: Duration::from_secs(5),
            lookup: Duration::from_secs(2),
        }
    }
}

const HISTORY_LIMIT: usize = 50;
const ACTIVE_LIMIT: usize = 20;
const ACTIVE_WINDOW_SECS: i64 = 60 * 60 * 24;

/// Job tracking and submission over a transport.
#[derive(Debug)]
pub struct JobService<T> {
    transport: T,
    timeouts: ServiceTimeouts,
}

impl<T: Transport> JobService<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timeouts: ServiceTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: ServiceTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch every response referencing `request` and derive its current
    /// lifecycle state.
    pub async fn job_state(
        &self,
        request: &RawRecord,
        cancel: &Cancel,
    ) -> Result<JobLifecycleState, TransportError> {
        let query_id = Uuid::now_v7();
        let filter = Filter::new()
            .kinds(known_response_kinds())
            .referencing([request.id.clone()]);
        let records =
            bounded_query(&self.transport, &[filter], self.timeouts.query, cancel).await?;
        debug!(%query_id, request = %request.id, responses = records.len(), "job state fetched");
        Ok(JobLifecycleState::derive_from_records(request, &records))
    }

    /// The author's request history, newest first.
    pub async fn job_history(
        &self,
        author: &Pubkey,
        cancel: &Cancel,
    ) -> Result<Vec<RawRecord>, TransportError> {
        let query_id = Uuid::now_v7();
        let filter = Filter::new()
            .kinds(known_request_kinds())
            .author(author.clone())
            .limit(HISTORY_LIMIT);
        let mut records =
            bounded_query(&self.transport, &[filter], self.timeouts.query, cancel).await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!(%query_id, author = %author, requests = records.len(), "job history fetched");
        Ok(records)
    }

    /// The author's still-active jobs from the last 24 hours, newest
    /// first. Jobs whose derived status is terminal are filtered out.
    pub async fn active_jobs(
        &self,
        author: &Pubkey,
        cancel: &Cancel,
    ) -> Result<Vec<JobLifecycleState>, TransportError> {
        let query_id = Uuid::now_v7();
        let since = Utc::now().timestamp() - ACTIVE_WINDOW_SECS;
        let requests_filter = Filter::new()
            .kinds(known_request_kinds())
            .author(author.clone())
            .limit(ACTIVE_LIMIT)
            .since(since);
        let requests =
            bounded_query(&self.transport, &[requests_filter], self.timeouts.query, cancel)
                .await?;
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let responses_filter = Filter::new()
            .kinds(known_response_kinds())
            .referencing(requests.iter().map(|r| r.id.clone()));
        let responses =
            bounded_query(&self.transport, &[responses_filter], self.timeouts.query, cancel)
                .await?;

        let index = CorrelationIndex::build(&requests, &responses);
        let mut states: Vec<JobLifecycleState> = index
            .groups()
            .into_iter()
            .map(|group| JobLifecycleState::derive(&group.request, &group.responses))
            .filter(JobLifecycleState::is_active)
            .collect();
        states.sort_by(|a, b| b.request.created_at.cmp(&a.request.created_at));
        debug!(%query_id, author = %author, active = states.len(), "active jobs derived");
        Ok(states)
    }

    /// The provider-centric job view: requests targeting `provider`
    /// stitched together with the provider's own responses.
    ///
    /// Responses referencing a request neither view fetched trigger
    /// exactly one backfill point query for those ids. The second query
    /// only runs after the first pass completes; backfills for different
    /// providers are free to run concurrently.
    pub async fn provider_jobs(
        &self,
        provider: &Pubkey,
        cancel: &Cancel,
    ) -> Result<Vec<JobGroup>, TransportError> {
        let query_id = Uuid::now_v7();
        // Requests that explicitly invited this provider.
        let targeted_filter = Filter::new()
            .kinds(known_request_kinds())
            .targeting(provider.clone())
            .limit(HISTORY_LIMIT);
        let targeted = bounded_query(
            &self.transport,
            &[targeted_filter],
            self.timeouts.backfill,
            cancel,
        )
        .await?;

        // Everything this provider has answered recently.
        let responses_filter = Filter::new()
            .kinds(known_response_kinds())
            .author(provider.clone())
            .limit(HISTORY_LIMIT);
        let responses = bounded_query(
            &self.transport,
            &[responses_filter],
            self.timeouts.backfill,
            cancel,
        )
        .await?;

        let mut index = CorrelationIndex::build(&targeted, &responses);
        let missing = index.needs_backfill();
        if !missing.is_empty() {
            debug!(%query_id, provider = %provider, missing = missing.len(), "backfilling referenced requests");
            let backfill = bounded_query(
                &self.transport,
                &[Filter::new().ids(missing)],
                self.timeouts.backfill,
                cancel,
            )
            .await?;
            index.absorb_requests(&backfill);
        }

        let groups: Vec<JobGroup> = index.groups().into_iter().cloned().collect();
        debug!(%query_id, provider = %provider, jobs = groups.len(), "provider job view stitched");
        Ok(groups)
    }

    /// Encode and publish a job request, returning the signed record.
    pub async fn submit(
        &self,
        request: &JobRequest,
        cancel: &Cancel,
    ) -> Result<RawRecord, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        let draft = codec::job_request_draft(request);
        let record = self.transport.publish(draft).await?;
        debug!(record = %record.id, kind = record.kind, "job request published");
        Ok(record)
    }
}

/// Provider directory reads over a transport.
#[derive(Debug)]
pub struct ProviderService<T> {
    transport: T,
    timeouts: ServiceTimeouts,
}

impl<T: Transport> ProviderService<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timeouts: ServiceTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: ServiceTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// List providers matching `query`, deduplicated newest-first.
    ///
    /// The kind/tag constraints are pushed relay-side (`#k`/`#t`) for
    /// efficiency and re-validated locally, since relays over-return.
    pub async fn list(
        &self,
        query: &ProviderQuery,
        cancel: &Cancel,
    ) -> Result<Vec<Provider>, TransportError> {
        let query_id = Uuid::now_v7();
        let mut filter = Filter::new().kinds([PROVIDER_ANNOUNCEMENT_KIND]);
        if !query.kinds.is_empty() {
            filter = filter.kind_tags(query.kinds.iter().copied());
        }
        if !query.tags.is_empty() {
            filter = filter.hashtags(query.tags.iter().cloned());
        }
        let records =
            bounded_query(&self.transport, &[filter], self.timeouts.query, cancel).await?;

        let providers: Vec<Provider> = dedupe_providers(&records)
            .into_iter()
            .filter(|p| query.matches(p))
            .collect();
        debug!(%query_id, announcements = records.len(), providers = providers.len(), "provider directory listed");
        Ok(providers)
    }

    /// The newest valid announcement for one identity, or `None`.
    pub async fn get(
        &self,
        pubkey: &Pubkey,
        cancel: &Cancel,
    ) -> Result<Option<Provider>, TransportError> {
        let filter = Filter::new()
            .kinds([PROVIDER_ANNOUNCEMENT_KIND])
            .author(pubkey.clone());
        let records =
            bounded_query(&self.transport, &[filter], self.timeouts.lookup, cancel).await?;
        Ok(newest_for(&records, pubkey))
    }
}
