//! `dvmdesk-core` — protocol foundation building blocks.
//!
//! This crate contains **pure protocol** primitives (no I/O, no async):
//! raw relay records, strongly-typed identifiers, and the numeric kind
//! space of the job protocol.

pub mod id;
pub mod kinds;
pub mod record;

pub use id::{EventId, IdError, Pubkey};
pub use kinds::{KindClass, classify, is_feedback_kind, is_request_kind, is_result_kind};
pub use record::{DraftRecord, RawRecord};
