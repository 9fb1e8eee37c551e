//! Throughput Benchmark for FlashQuery
//!
//! This benchmark measures command parsing, RESP reply parsing, result
//! shaping and full query execution against the in-memory store.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use flashquery::protocol::{parse_message, RespValue};
use flashquery::query::{self, shape_hash, Command};
use flashquery::store::MemoryStore;

/// Benchmark query line parsing
fn bench_command_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_parse");
    group.throughput(Throughput::Elements(1));

    group.bench_function("key", |b| {
        b.iter(|| black_box(Command::parse(black_box("key greeting"))));
    });

    group.bench_function("hashkey", |b| {
        b.iter(|| black_box(Command::parse(black_box("HASHKEY user:1 name"))));
    });

    group.bench_function("unsupported", |b| {
        b.iter(|| black_box(Command::parse(black_box("list queue"))));
    });

    group.finish();
}

/// Benchmark parsing of store replies
fn bench_reply_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("reply_parse");

    let bulk = RespValue::bulk_string("x".repeat(1024)).serialize();
    group.throughput(Throughput::Bytes(bulk.len() as u64));
    group.bench_function("bulk_1kb", |b| {
        b.iter(|| black_box(parse_message(black_box(&bulk))));
    });

    let members: Vec<RespValue> = (0..1000)
        .map(|i| RespValue::bulk_string(format!("member:{}", i)))
        .collect();
    let array = RespValue::array(members).serialize();
    group.throughput(Throughput::Bytes(array.len() as u64));
    group.bench_function("array_1000", |b| {
        b.iter(|| black_box(parse_message(black_box(&array))));
    });

    group.finish();
}

/// Benchmark turning a hash reply into a table
fn bench_shape(c: &mut Criterion) {
    let fields: Vec<(Bytes, Bytes)> = (0..1000)
        .map(|i| {
            (
                Bytes::from(format!("field:{}", i)),
                Bytes::from(format!("value:{}", i)),
            )
        })
        .collect();

    let mut group = c.benchmark_group("shape");
    group.throughput(Throughput::Elements(fields.len() as u64));
    group.bench_function("hash_1000", |b| {
        b.iter(|| black_box(shape_hash(fields.clone())));
    });
    group.finish();
}

/// Benchmark full queries against the in-memory store
fn bench_run(c: &mut Criterion) {
    let store = MemoryStore::new();
    store.set("greeting", "hello");
    for i in 0..1000 {
        store.zadd("leaderboard", i as f64, format!("player:{}", i));
        store.hset("user:1", format!("field:{}", i), format!("value:{}", i));
    }

    let mut group = c.benchmark_group("run");

    group.bench_function("key", |b| {
        b.iter(|| black_box(tokio_test::block_on(query::run(&store, "key greeting"))));
    });

    group.bench_function("zset_1000", |b| {
        b.iter(|| black_box(tokio_test::block_on(query::run(&store, "zset leaderboard"))));
    });

    group.bench_function("hash_1000", |b| {
        b.iter(|| black_box(tokio_test::block_on(query::run(&store, "hash user:1"))));
    });

    group.bench_function("schema", |b| {
        b.iter(|| black_box(tokio_test::block_on(query::inspect(&store))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_command_parse,
    bench_reply_parse,
    bench_shape,
    bench_run,
);

criterion_main!(benches);
