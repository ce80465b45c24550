//! Benchmarks for key and payload generation.
//!
//! Run with: `cargo bench --bench generators`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use cachedrill::generator::{GaussianKeySampler, KeySequence, PayloadGenerator};
use cachedrill::store::{CacheUnderTest, CopyPolicy, HeapStore};

const DOMAIN: u64 = 100_000;

fn bench_sequential_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("generators");
    group.throughput(Throughput::Elements(DOMAIN));

    group.bench_function("sequential_keys", |b| {
        let sequence = KeySequence::new(DOMAIN);
        b.iter(|| {
            for index in 0..DOMAIN {
                let _ = black_box(sequence.key_at(black_box(index)));
            }
        })
    });

    group.finish();
}

fn bench_gaussian_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("generators");
    let samples = 10_000u64;
    group.throughput(Throughput::Elements(samples));

    group.bench_function("gaussian_keys", |b| {
        let mut sampler =
            GaussianKeySampler::new(DOMAIN, DOMAIN / 2, DOMAIN / 10, 42).unwrap();
        b.iter(|| {
            for _ in 0..samples {
                black_box(sampler.sample());
            }
        })
    });

    group.finish();
}

fn bench_payload_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generators");
    group.throughput(Throughput::Bytes(4096));

    group.bench_function("payload_4k", |b| {
        let payload = PayloadGenerator::new(4096).unwrap();
        let mut key = 0u64;
        b.iter(|| {
            key = key.wrapping_add(1);
            black_box(payload.value_for(black_box(key)))
        })
    });

    group.finish();
}

fn bench_store_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap_store");
    let keys = 1024u64;
    group.throughput(Throughput::Elements(keys));

    group.bench_function("get_hit", |b| {
        let store = HeapStore::new(CopyPolicy::Shared);
        let payload = PayloadGenerator::new(64).unwrap();
        for key in 0..keys {
            store.put(key, payload.value_for(key)).unwrap();
        }
        b.iter(|| {
            for key in 0..keys {
                let _ = black_box(store.get(black_box(key)));
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_keys,
    bench_gaussian_keys,
    bench_payload_generation,
    bench_store_get
);
criterion_main!(benches);
