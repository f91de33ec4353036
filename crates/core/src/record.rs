//! Raw relay records.
//!
//! A [`RawRecord`] is the generic signed unit fetched from relays. The
//! network offers no ordering, no delivery guarantee and no deduplication;
//! everything above this layer must treat records as an unordered,
//! duplicate-prone snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{EventId, Pubkey};

/// A signed record as fetched from the network.
///
/// Tags are positional string arrays; position 0 is the tag name. All
/// structure above raw tags (inputs, bids, references) lives in the
/// engine's codec, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: EventId,
    pub kind: u16,
    pub pubkey: Pubkey,
    /// Unix seconds, as published by the author. Not trustworthy as a
    /// global clock; only used for newest-wins tie-breaks.
    pub created_at: i64,
    pub content: String,
    pub tags: Vec<Vec<String>>,
}

impl RawRecord {
    /// First tag with the given name, if any.
    pub fn first_tag(&self, name: &str) -> Option<&[String]> {
        self.tags
            .iter()
            .find(|t| t.first().is_some_and(|n| n == name))
            .map(Vec::as_slice)
    }

    /// All tags with the given name, in publication order.
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a [String]> {
        self.tags
            .iter()
            .filter(move |t| t.first().is_some_and(|n| n == name))
            .map(Vec::as_slice)
    }

    /// Whether any tag with the given name is present.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.first().is_some_and(|n| n == name))
    }

    /// Creation time as a UTC timestamp.
    ///
    /// Out-of-range values clamp to the unix epoch rather than failing;
    /// authors control this field and garbage must not abort a batch.
    pub fn created_at_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.created_at, 0).unwrap_or_else(|| DateTime::UNIX_EPOCH)
    }
}

/// An unsigned record handed to the transport for signing and publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub kind: u16,
    pub content: String,
    pub tags: Vec<Vec<String>>,
}
