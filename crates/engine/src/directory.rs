//! The service-provider directory.
//!
//! The network allows unlimited republication of announcements, so the
//! directory models "latest self-description replaces all earlier ones":
//! announcements are keyed by identity and the newest valid one wins.

use std::collections::HashMap;

use tracing::debug;

use dvmdesk_core::{Pubkey, RawRecord};

use crate::codec::decode_provider;
use crate::types::Provider;

/// Filter for listing providers.
///
/// Matched relay-side for efficiency (`#k` / `#t` filters) and
/// re-validated locally with [`matches`](Self::matches), since relays are
/// free to over-return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderQuery {
    /// Required supported job kinds; empty means any.
    pub kinds: Vec<u16>,
    /// Required specialization tags; empty means any.
    pub tags: Vec<String>,
}

impl ProviderQuery {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: u16) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Local re-validation of a decoded provider against this query.
    pub fn matches(&self, provider: &Provider) -> bool {
        let kinds_ok = self.kinds.is_empty()
            || self
                .kinds
                .iter()
                .any(|k| provider.supported_kinds.contains(k));
        let tags_ok =
            self.tags.is_empty() || self.tags.iter().any(|t| provider.tags.contains(t));
        kinds_ok && tags_ok
    }
}

/// Decode and deduplicate announcement records into the directory view.
///
/// Announcements that advertise no kind in the job-request range are not
/// providers and are dropped regardless of other metadata. Per identity
/// the announcement with the larger source timestamp wins; the output is
/// sorted most recently announced first.
pub fn dedupe_providers(records: &[RawRecord]) -> Vec<Provider> {
    let mut by_pubkey: HashMap<Pubkey, Provider> = HashMap::new();
    let mut dropped = 0usize;

    for record in records {
        let Some(provider) = decode_provider(record) else {
            dropped += 1;
            continue;
        };
        if !provider.handles_job_kinds() {
            dropped += 1;
            continue;
        }
        match by_pubkey.get(&provider.pubkey) {
            Some(existing) if existing.record.created_at >= provider.record.created_at => {}
            _ => {
                by_pubkey.insert(provider.pubkey.clone(), provider);
            }
        }
    }
    if dropped > 0 {
        debug!(dropped, kept = by_pubkey.len(), "provider announcements filtered");
    }

    let mut providers: Vec<Provider> = by_pubkey.into_values().collect();
    providers.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
    providers
}

/// The newest valid announcement for one identity, or `None`.
pub fn newest_for(records: &[RawRecord], pubkey: &Pubkey) -> Option<Provider> {
    dedupe_providers(records)
        .into_iter()
        .find(|p| &p.pubkey == pubkey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvmdesk_core::EventId;

    fn announcement(
        n: u8,
        pubkey: &str,
        created_at: i64,
        name: &str,
        kinds: &[u16],
        tags: &[&str],
    ) -> RawRecord {
        let mut record_tags: Vec<Vec<String>> = kinds
            .iter()
            .map(|k| vec!["k".to_owned(), k.to_string()])
            .collect();
        record_tags.extend(tags.iter().map(|t| vec!["t".to_owned(), (*t).to_owned()]));
        RawRecord {
            id: EventId::new(format!("{n:02x}").repeat(32)),
            kind: 31990,
            pubkey: Pubkey::new(pubkey.repeat(32)),
            created_at,
            content: format!("{{\"name\":\"{name}\"}}"),
            tags: record_tags,
        }
    }

    #[test]
    fn newest_announcement_wins() {
        let records = vec![
            announcement(1, "aa", 100, "old name", &[5001], &[]),
            announcement(2, "aa", 200, "new name", &[5001], &[]),
        ];
        let providers = dedupe_providers(&records);
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name.as_deref(), Some("new name"));
    }

    #[test]
    fn announcement_without_job_kinds_is_excluded() {
        let records = vec![
            announcement(1, "aa", 100, "not a job provider", &[31337], &["music"]),
            announcement(2, "bb", 100, "no kinds at all", &[], &[]),
        ];
        assert!(dedupe_providers(&records).is_empty());
    }

    #[test]
    fn directory_sorts_newest_first() {
        let records = vec![
            announcement(1, "aa", 100, "older", &[5001], &[]),
            announcement(2, "bb", 300, "newest", &[5002], &[]),
            announcement(3, "cc", 200, "middle", &[5003], &[]),
        ];
        let names: Vec<_> = dedupe_providers(&records)
            .iter()
            .map(|p| p.name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["newest", "middle", "older"]);
    }

    #[test]
    fn query_revalidates_kinds_and_tags() {
        let records = vec![announcement(1, "aa", 100, "x", &[5002], &["translation"])];
        let providers = dedupe_providers(&records);

        assert!(ProviderQuery::any().matches(&providers[0]));
        assert!(ProviderQuery::any().with_kind(5002).matches(&providers[0]));
        assert!(!ProviderQuery::any().with_kind(5100).matches(&providers[0]));
        assert!(ProviderQuery::any().with_tag("translation").matches(&providers[0]));
        assert!(
            !ProviderQuery::any()
                .with_kind(5002)
                .with_tag("imaging")
                .matches(&providers[0])
        );
    }

    #[test]
    fn newest_for_finds_one_identity() {
        let records = vec![
            announcement(1, "aa", 100, "a", &[5001], &[]),
            announcement(2, "bb", 200, "b", &[5001], &[]),
        ];
        let found = newest_for(&records, &Pubkey::new("bb".repeat(32))).unwrap();
        assert_eq!(found.name.as_deref(), Some("b"));
        assert!(newest_for(&records, &Pubkey::new("cc".repeat(32))).is_none());
    }
}
