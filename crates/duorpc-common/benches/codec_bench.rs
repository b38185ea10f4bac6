//! Codec encode/decode benchmarks across the three wire encodings.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use duorpc_common::codec::Codec;
use duorpc_common::{Message, WireFrame};
use serde_json::json;

fn sample_request() -> Message {
    Message::request(
        "18446744073709551615",
        "searchUsers",
        json!({
            "query": "name:J* AND active:true",
            "page": {"offset": 40, "limit": 20},
            "fields": ["id", "name", "email", "roles"],
        }),
    )
}

fn bench_encode(c: &mut Criterion) {
    let message = sample_request();
    let mut group = c.benchmark_group("encode");
    for (name, codec) in [
        ("json", Codec::json()),
        ("msgpack", Codec::msgpack()),
        ("cbor", Codec::cbor()),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| codec.encode(black_box(&message)).unwrap())
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let message = sample_request();
    let mut group = c.benchmark_group("decode");
    for (name, codec) in [
        ("json", Codec::json()),
        ("msgpack", Codec::msgpack()),
        ("cbor", Codec::cbor()),
    ] {
        let frame = codec.encode(&message).unwrap();
        group.bench_function(name, |b| match &frame {
            WireFrame::Text(text) => b.iter(|| codec.decode_text(black_box(text)).unwrap()),
            WireFrame::Binary(bytes) => b.iter(|| codec.decode_binary(black_box(bytes)).unwrap()),
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
