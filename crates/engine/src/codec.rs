//! Tag codec: structured entities ⇄ generic tagged records.
//!
//! Decode operations are total and defensive. The network is best-effort
//! and permissionless, so a malformed record never propagates an error
//! past this boundary: it decodes to `None` (or a skipped entry) and the
//! rest of the batch proceeds. Every optional positional field has an
//! explicit absence default, spelled out at its extraction site.
//!
//! Encoding exists for requests only; results, feedback and announcements
//! are produced by remote providers and never encoded locally.

use dvmdesk_core::kinds::{PROVIDER_ANNOUNCEMENT_KIND, is_request_kind};
use dvmdesk_core::{DraftRecord, RawRecord};
use serde::Deserialize;

use crate::types::{
    InputKind, JobFeedback, JobInput, JobParam, JobRequest, JobResult, Provider,
};

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

/// Decode all `i` tags into job inputs.
///
/// Positional layout: `["i", data, type, relay, marker]`. A blank or
/// unknown type defaults to `text`; an empty relay slot means "no relay"
/// (the slot is still emitted on encode when a marker follows it).
pub fn decode_inputs(record: &RawRecord) -> Vec<JobInput> {
    record
        .tags_named("i")
        .map(|tag| JobInput {
            data: tag.get(1).cloned().unwrap_or_default(),
            kind: InputKind::parse_or_default(tag.get(2).map_or("", String::as_str)),
            relay: non_empty(tag.get(3)),
            marker: non_empty(tag.get(4)),
        })
        .collect()
}

/// Decode all `param` tags into job parameters, order preserved.
pub fn decode_params(record: &RawRecord) -> Vec<JobParam> {
    record
        .tags_named("param")
        .map(|tag| JobParam {
            key: tag.get(1).cloned().unwrap_or_default(),
            value: tag.get(2).cloned().unwrap_or_default(),
        })
        .collect()
}

/// Decode a job request from a record.
///
/// Total: every field has an absence default, so any record in the
/// request-kind range yields a structured request.
pub fn decode_job_request(record: &RawRecord) -> JobRequest {
    let output = record.first_tag("output").and_then(|t| t.get(1).cloned());
    let bid_msat = record
        .first_tag("bid")
        .and_then(|t| t.get(1))
        .and_then(|v| v.parse().ok());
    let relay_hints = record
        .first_tag("relays")
        .map(|t| t[1..].to_vec())
        .unwrap_or_default();
    let providers = record
        .tags_named("p")
        .filter_map(|t| t.get(1))
        .filter_map(|v| v.parse().ok())
        .collect();

    JobRequest {
        kind: record.kind,
        content: record.content.clone(),
        inputs: decode_inputs(record),
        params: decode_params(record),
        output,
        bid_msat,
        relay_hints,
        providers,
        encrypted: record.has_tag("encrypted"),
    }
}

/// Decode a job result.
///
/// The `request` tag must carry a JSON-serialized copy of the originating
/// request record; without it the result answers nothing and the whole
/// record is discarded.
pub fn decode_job_result(record: &RawRecord) -> Option<JobResult> {
    let embedded = record.first_tag("request")?.get(1)?;
    let request: RawRecord = serde_json::from_str(embedded).ok()?;

    let amount = record.first_tag("amount");
    Some(JobResult {
        payload: record.content.clone(),
        amount_msat: amount.and_then(|t| t.get(1)).and_then(|v| v.parse().ok()),
        invoice: amount.and_then(|t| t.get(2).cloned()),
        encrypted: record.has_tag("encrypted"),
        request,
        record: record.clone(),
    })
}

/// Decode job feedback.
///
/// A record without a recognized `status` marker is invalid and discarded.
pub fn decode_job_feedback(record: &RawRecord) -> Option<JobFeedback> {
    let status_tag = record.first_tag("status")?;
    let status = status_tag.get(1)?.parse().ok()?;

    let amount = record.first_tag("amount");
    Some(JobFeedback {
        status,
        extra_info: status_tag.get(2).cloned(),
        amount_msat: amount.and_then(|t| t.get(1)).and_then(|v| v.parse().ok()),
        invoice: amount.and_then(|t| t.get(2).cloned()),
        partial_payload: (!record.content.is_empty()).then(|| record.content.clone()),
        record: record.clone(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ProviderMetadata {
    name: Option<String>,
    about: Option<String>,
    picture: Option<String>,
    nip05: Option<String>,
    lud16: Option<String>,
}

/// Decode a provider self-announcement.
///
/// Only valid for the announcement kind. The body is a JSON metadata
/// object; invalid JSON is tolerated as empty metadata rather than
/// discarding the announcement. Non-numeric `k` tags are dropped.
pub fn decode_provider(record: &RawRecord) -> Option<Provider> {
    if record.kind != PROVIDER_ANNOUNCEMENT_KIND {
        return None;
    }

    let metadata: ProviderMetadata = if record.content.is_empty() {
        ProviderMetadata::default()
    } else {
        serde_json::from_str(&record.content).unwrap_or_default()
    };

    let supported_kinds = record
        .tags_named("k")
        .filter_map(|t| t.get(1))
        .filter_map(|v| v.parse().ok())
        .collect();
    let tags = record.tags_named("t").filter_map(|t| t.get(1).cloned()).collect();

    Some(Provider {
        pubkey: record.pubkey.clone(),
        name: metadata.name,
        about: metadata.about,
        picture: metadata.picture,
        nip05: metadata.nip05,
        lud16: metadata.lud16,
        supported_kinds,
        tags,
        record: record.clone(),
    })
}

/// Whether a record is a plausible job request: request-range kind and at
/// least one input or some content to work on.
pub fn validate_job_request(record: &RawRecord) -> bool {
    if !is_request_kind(record.kind) {
        return false;
    }
    record.has_tag("i") || !record.content.trim().is_empty()
}

/// Encode job inputs as `i` tags.
///
/// When a marker is present without a relay, an empty relay slot is
/// emitted so positions stay stable and decode round-trips.
pub fn input_tags(inputs: &[JobInput]) -> Vec<Vec<String>> {
    inputs
        .iter()
        .map(|input| {
            let mut tag = vec!["i".to_owned(), input.data.clone(), input.kind.as_str().to_owned()];
            match (&input.relay, &input.marker) {
                (Some(relay), Some(marker)) => {
                    tag.push(relay.clone());
                    tag.push(marker.clone());
                }
                (Some(relay), None) => tag.push(relay.clone()),
                (None, Some(marker)) => {
                    tag.push(String::new());
                    tag.push(marker.clone());
                }
                (None, None) => {}
            }
            tag
        })
        .collect()
}

/// Encode job parameters as `param` tags.
pub fn param_tags(params: &[JobParam]) -> Vec<Vec<String>> {
    params
        .iter()
        .map(|p| vec!["param".to_owned(), p.key.clone(), p.value.clone()])
        .collect()
}

/// Encode a request's full tag list: inputs, params, output, bid, relay
/// hints, targeted providers, encryption flag, in that order.
pub fn job_request_tags(request: &JobRequest) -> Vec<Vec<String>> {
    let mut tags = input_tags(&request.inputs);
    tags.extend(param_tags(&request.params));

    if let Some(output) = &request.output {
        tags.push(vec!["output".to_owned(), output.clone()]);
    }
    if let Some(bid) = request.bid_msat {
        tags.push(vec!["bid".to_owned(), bid.to_string()]);
    }
    if !request.relay_hints.is_empty() {
        let mut tag = vec!["relays".to_owned()];
        tag.extend(request.relay_hints.iter().cloned());
        tags.push(tag);
    }
    for provider in &request.providers {
        tags.push(vec!["p".to_owned(), provider.to_string()]);
    }
    if request.encrypted {
        tags.push(vec!["encrypted".to_owned()]);
    }
    tags
}

/// Build the unsigned record for a request, ready for publication.
pub fn job_request_draft(request: &JobRequest) -> DraftRecord {
    DraftRecord {
        kind: request.kind,
        content: request.content.clone(),
        tags: job_request_tags(request),
    }
}
