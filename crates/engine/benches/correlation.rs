//! Correlation index throughput over synthetic response batches.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use dvmdesk_core::{EventId, Pubkey, RawRecord};
use dvmdesk_engine::CorrelationIndex;

fn hex_id(n: usize) -> EventId {
    EventId::new(format!("{n:064x}"))
}

fn synthetic_batch(requests: usize, responses_per: usize) -> (Vec<RawRecord>, Vec<RawRecord>) {
    let pubkey = Pubkey::new("aa".repeat(32));
    let mut reqs = Vec::with_capacity(requests);
    let mut resps = Vec::with_capacity(requests * responses_per);
    for i in 0..requests {
        let id = hex_id(i);
        reqs.push(RawRecord {
            id: id.clone(),
            kind: 5001,
            pubkey: pubkey.clone(),
            created_at: i as i64,
            content: String::new(),
            tags: vec![],
        });
        for j in 0..responses_per {
            resps.push(RawRecord {
                id: hex_id(1_000_000 + i * responses_per + j),
                kind: if j == 0 { 6001 } else { 7000 },
                pubkey: pubkey.clone(),
                created_at: (i + j) as i64,
                content: String::new(),
                tags: vec![vec!["e".to_owned(), id.to_string()]],
            });
        }
    }
    (reqs, resps)
}

fn bench_build(c: &mut Criterion) {
    let (requests, responses) = synthetic_batch(100, 5);
    c.bench_function("correlation_index_build_100x5", |b| {
        b.iter(|| CorrelationIndex::build(black_box(&requests), black_box(&responses)))
    });
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
