//! In-process transport for tests.
//!
//! A deterministic stand-in for the relay layer: seeded records, the same
//! filter semantics relays apply, and a publish path that assigns
//! synthetic ids. No network, no signing.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use dvmdesk_core::{DraftRecord, EventId, Pubkey, RawRecord};

use crate::transport::{Filter, Transport, TransportError};

/// Deterministic in-memory relay.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    records: Mutex<Vec<RawRecord>>,
    counter: AtomicU64,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the relay with pre-existing records.
    pub fn seeded(records: impl IntoIterator<Item = RawRecord>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
            counter: AtomicU64::new(0),
        }
    }

    /// Add a record after construction (e.g. a provider response arriving
    /// mid-test).
    pub fn insert(&self, record: RawRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// Snapshot of everything the relay holds, published records included.
    pub fn all_records(&self) -> Vec<RawRecord> {
        self.records.lock().unwrap().clone()
    }

    fn matches(filter: &Filter, record: &RawRecord) -> bool {
        if !filter.kinds.is_empty() && !filter.kinds.contains(&record.kind) {
            return false;
        }
        if !filter.authors.is_empty() && !filter.authors.contains(&record.pubkey) {
            return false;
        }
        if !filter.ids.is_empty() && !filter.ids.contains(&record.id) {
            return false;
        }
        if !filter.referenced_ids.is_empty() {
            let referenced = record
                .tags_named("e")
                .filter_map(|t| t.get(1))
                .any(|v| filter.referenced_ids.iter().any(|id| id.as_str() == v));
            if !referenced {
                return false;
            }
        }
        if !filter.mentioned.is_empty() {
            let mentioned = record
                .tags_named("p")
                .filter_map(|t| t.get(1))
                .any(|v| filter.mentioned.iter().any(|p| p.as_str() == v));
            if !mentioned {
                return false;
            }
        }
        if !filter.kind_tags.is_empty() {
            let advertised = record
                .tags_named("k")
                .filter_map(|t| t.get(1))
                .filter_map(|v| v.parse::<u16>().ok())
                .any(|k| filter.kind_tags.contains(&k));
            if !advertised {
                return false;
            }
        }
        if !filter.hashtags.is_empty() {
            let tagged = record
                .tags_named("t")
                .filter_map(|t| t.get(1))
                .any(|v| filter.hashtags.iter().any(|t| t == v));
            if !tagged {
                return false;
            }
        }
        if let Some(since) = filter.since
            && record.created_at < since
        {
            return false;
        }
        true
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn query(&self, filters: &[Filter]) -> Result<Vec<RawRecord>, TransportError> {
        let records = self.records.lock().unwrap();
        let mut out: Vec<RawRecord> = Vec::new();
        for filter in filters {
            let mut matched: Vec<RawRecord> = records
                .iter()
                .filter(|r| Self::matches(filter, r))
                .cloned()
                .collect();
            // Relays serve newest first when trimming to a limit.
            matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            if let Some(limit) = filter.limit {
                matched.truncate(limit);
            }
            out.extend(matched);
        }
        let mut seen = std::collections::HashSet::new();
        out.retain(|r| seen.insert(r.id.clone()));
        Ok(out)
    }

    async fn publish(&self, draft: DraftRecord) -> Result<RawRecord, TransportError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let record = RawRecord {
            id: EventId::new(format!("{n:064x}")),
            kind: draft.kind,
            pubkey: Pubkey::new("ee".repeat(32)),
            created_at: Utc::now().timestamp(),
            content: draft.content,
            tags: draft.tags,
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }
}
