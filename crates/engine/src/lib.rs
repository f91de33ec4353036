//! `dvmdesk-engine` — the job protocol reconciliation engine.
//!
//! The network underneath is append-only, eventually consistent and
//! permissionless: responses arrive unordered, duplicated, late or never,
//! from providers nobody vetted. This crate turns that into something
//! coherent:
//!
//! - [`codec`] maps generic tagged records to and from structured job
//!   requests, results, feedback and provider announcements;
//! - [`correlate`] stitches responses back to the requests they reference;
//! - [`lifecycle`] derives a single well-defined status per job;
//! - [`directory`] deduplicates provider announcements, newest wins;
//! - [`poll`] decides whether a job is still worth re-querying.
//!
//! Everything here is a pure transform over fetched snapshots. Nothing is
//! mutated in place and nothing is persisted; each batch of records
//! produces a fresh derived view.

pub mod codec;
pub mod correlate;
pub mod directory;
pub mod lifecycle;
pub mod poll;
pub mod types;

pub use correlate::{CorrelationIndex, JobResponse, ResponseKind};
pub use directory::{ProviderQuery, dedupe_providers, newest_for};
pub use lifecycle::JobLifecycleState;
pub use poll::{PollScope, next_poll_delay};
pub use types::{
    FeedbackStatus, InputKind, JobFeedback, JobInput, JobParam, JobRequest, JobResult, JobStatus,
    Provider, UnknownFeedbackStatus,
};
