//! The transport seam: querying and publishing records on relays.
//!
//! The actual relay plumbing (websockets, signing, relay selection) is an
//! external collaborator. This module defines the object-safe trait it
//! implements, the filter shape it accepts, and the bounding machinery
//! that keeps every outbound query finite: a per-query timeout composed
//! with an externally supplied cancellation signal, whichever fires
//! first.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use dvmdesk_core::{DraftRecord, EventId, Pubkey, RawRecord};

/// A relay-side query filter.
///
/// Empty collections mean "no constraint". Relays may return fewer
/// records than match (server-side limits) and may return duplicates
/// across separate calls; callers must treat results as a best-effort
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub kinds: Vec<u16>,
    pub authors: Vec<Pubkey>,
    pub ids: Vec<EventId>,
    /// Records whose reference (`e`) tag names one of these ids.
    pub referenced_ids: Vec<EventId>,
    /// Records whose `p` tag names one of these identities.
    pub mentioned: Vec<Pubkey>,
    /// Records whose `k` tag advertises one of these kinds.
    pub kind_tags: Vec<u16>,
    /// Records carrying one of these `t` tags.
    pub hashtags: Vec<String>,
    pub limit: Option<usize>,
    /// Unix-seconds lower bound on creation time.
    pub since: Option<i64>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = u16>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    pub fn author(mut self, author: Pubkey) -> Self {
        self.authors.push(author);
        self
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = EventId>) -> Self {
        self.ids = ids.into_iter().collect();
        self
    }

    pub fn referencing(mut self, ids: impl IntoIterator<Item = EventId>) -> Self {
        self.referenced_ids = ids.into_iter().collect();
        self
    }

    pub fn targeting(mut self, pubkey: Pubkey) -> Self {
        self.mentioned.push(pubkey);
        self
    }

    pub fn kind_tags(mut self, kinds: impl IntoIterator<Item = u16>) -> Self {
        self.kind_tags = kinds.into_iter().collect();
        self
    }

    pub fn hashtags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.hashtags = tags.into_iter().collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn since(mut self, since: i64) -> Self {
        self.since = Some(since);
        self
    }
}

/// Transport-level failure. Surfaced to the caller, which decides whether
/// to retry on the next poll tick (never within the same tick).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The relay layer reported a failure.
    #[error("relay error: {0}")]
    Relay(String),

    /// The per-query timeout elapsed first.
    #[error("query timed out")]
    Timeout,

    /// The external cancellation signal fired first.
    #[error("query cancelled")]
    Cancelled,
}

/// The async query/publish surface the relay layer provides.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch records matching any of the filters.
    async fn query(&self, filters: &[Filter]) -> Result<Vec<RawRecord>, TransportError>;

    /// Sign and publish a draft, returning the signed record.
    async fn publish(&self, draft: DraftRecord) -> Result<RawRecord, TransportError>;
}

/// Cloneable cancellation signal.
///
/// Independent logical queries each carry their own `Cancel` clone; firing
/// the owning [`CancelHandle`] aborts all of them.
#[derive(Debug, Clone)]
pub struct Cancel {
    rx: watch::Receiver<bool>,
}

impl Cancel {
    /// A signal that never fires. Useful for one-shot tools and tests.
    pub fn never() -> Self {
        static NEVER: OnceLock<watch::Sender<bool>> = OnceLock::new();
        let tx = NEVER.get_or_init(|| watch::channel(false).0);
        Self { rx: tx.subscribe() }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when the signal fires; pends forever if it never can.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender gone without firing; cancellation can no longer
                // happen on this signal.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Owning side of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            tx: watch::channel(false).0,
        }
    }

    pub fn signal(&self) -> Cancel {
        Cancel {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one query bounded by a timeout and a cancellation signal.
///
/// Resolves with the query result, [`TransportError::Timeout`] or
/// [`TransportError::Cancelled`], whichever happens first. There is no
/// unbounded wait.
pub async fn bounded_query<T: Transport + ?Sized>(
    transport: &T,
    filters: &[Filter],
    timeout: Duration,
    cancel: &Cancel,
) -> Result<Vec<RawRecord>, TransportError> {
    tokio::select! {
        result = tokio::time::timeout(timeout, transport.query(filters)) => {
            match result {
                Ok(inner) => inner,
                Err(_) => Err(TransportError::Timeout),
            }
        }
        () = cancel.cancelled() => Err(TransportError::Cancelled),
    }
}
