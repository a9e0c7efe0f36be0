use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use zvol_decoder::VolumeDecoder;
use zvol_engine::{EngineConfig, IsolatedEngine, SharedEngine, ZstdEngine, ZstdTemplate};
use zvol_tests::{ContainerBuilder, ramp_u32};
use zvol_wire::frame::read_metadata;

fn container(n: u32) -> Vec<u8> {
    let (header, payload) = ramp_u32(n);
    ContainerBuilder::new(header).payload(payload).build().unwrap()
}

fn bench_metadata(c: &mut Criterion) {
    let bytes = container(16);

    c.bench_function("read_metadata", |b| {
        b.iter(|| read_metadata(&bytes, 64 * 1024).unwrap());
    });
}

fn bench_decode_small(c: &mut Criterion) {
    let bytes = container(16);
    let engine = ZstdEngine::new(EngineConfig::default()).unwrap();
    let decoder = VolumeDecoder::default();

    c.bench_function("decode_small", |b| {
        b.iter(|| decoder.decode(&engine, &bytes).unwrap());
    });
}

fn bench_decode_strategy(c: &mut Criterion) {
    let bytes = container(64 * 1024);
    let decoder = VolumeDecoder::default();

    let shared = SharedEngine::new(Arc::new(ZstdEngine::new(EngineConfig::default()).unwrap()));
    let isolated = IsolatedEngine::new(Arc::new(ZstdTemplate::new(EngineConfig::default()).unwrap()));

    let mut group = c.benchmark_group("decode_strategy");

    group.bench_function("shared", |b| {
        b.iter(|| decoder.decode_with(&shared, &bytes).unwrap());
    });
    group.bench_function("isolated", |b| {
        b.iter(|| decoder.decode_with(&isolated, &bytes).unwrap());
    });

    group.finish();
}

fn bench_decode_throughput(c: &mut Criterion) {
    let engine = ZstdEngine::new(EngineConfig::default()).unwrap();
    let decoder = VolumeDecoder::default();
    let mut group = c.benchmark_group("decode_throughput");

    for size_kb in [4u32, 64, 1024] {
        let bytes = container(size_kb * 256);
        group.throughput(Throughput::Bytes(u64::from(size_kb) * 1024));
        group.bench_with_input(BenchmarkId::from_parameter(size_kb), &bytes, |b, bytes| {
            b.iter(|| decoder.decode(&engine, bytes).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_metadata,
    bench_decode_small,
    bench_decode_strategy,
    bench_decode_throughput
);
criterion_main!(benches);
