//! Encode/decode round-trip property for job requests.

use proptest::collection::vec;
use proptest::option;
use proptest::prelude::*;

use dvmdesk_core::{EventId, Pubkey, RawRecord};
use dvmdesk_engine::codec::{decode_job_request, job_request_draft};
use dvmdesk_engine::types::{InputKind, JobInput, JobParam, JobRequest};

fn input_kind() -> impl Strategy<Value = InputKind> {
    prop_oneof![
        Just(InputKind::Url),
        Just(InputKind::Event),
        Just(InputKind::Job),
        Just(InputKind::Text),
    ]
}

fn job_input() -> impl Strategy<Value = JobInput> {
    (
        "[a-zA-Z0-9 ./:_-]{0,40}",
        input_kind(),
        option::of("wss://[a-z]{3,12}\\.example"),
        option::of("[a-z]{1,12}"),
    )
        .prop_map(|(data, kind, relay, marker)| JobInput {
            data,
            kind,
            relay,
            marker,
        })
}

fn job_param() -> impl Strategy<Value = JobParam> {
    ("[a-z]{1,10}", "[a-zA-Z0-9_-]{0,20}")
        .prop_map(|(key, value)| JobParam { key, value })
}

fn pubkey() -> impl Strategy<Value = Pubkey> {
    "[0-9a-f]{64}".prop_map(Pubkey::new)
}

fn job_request() -> impl Strategy<Value = JobRequest> {
    (
        5000u16..6000,
        "[a-zA-Z0-9 ]{0,60}",
        vec(job_input(), 0..4),
        vec(job_param(), 0..4),
        option::of("[a-z/]{1,20}"),
        option::of(0u64..10_000_000),
        vec("wss://[a-z]{3,12}\\.example", 0..3),
        vec(pubkey(), 0..3),
        any::<bool>(),
    )
        .prop_map(
            |(kind, content, inputs, params, output, bid_msat, relay_hints, providers, encrypted)| {
                JobRequest {
                    kind,
                    content,
                    inputs,
                    params,
                    output,
                    bid_msat,
                    relay_hints,
                    providers,
                    encrypted,
                }
            },
        )
}

proptest! {
    #[test]
    fn decode_inverts_encode(request in job_request()) {
        let draft = job_request_draft(&request);
        let record = RawRecord {
            id: EventId::new("ab".repeat(32)),
            kind: draft.kind,
            pubkey: Pubkey::new("cd".repeat(32)),
            created_at: 1_700_000_000,
            content: draft.content,
            tags: draft.tags,
        };
        let decoded = decode_job_request(&record);
        prop_assert_eq!(decoded, request);
    }
}
