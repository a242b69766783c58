//! Benchmarks for the encode → frame → modulate chain
//!
//! Run with: cargo bench -p aistx-core --bench pipeline_bench

use aistx_core::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn vessel() -> VesselState {
    VesselState::new(123456789, "BENCH", 37.7749, -122.4194).with_motion(45.0, 12.5)
}

fn bench_encode(c: &mut Criterion) {
    let v = vessel();
    c.bench_function("encode_type1", |b| {
        b.iter(|| encode(black_box(&v), MessageType::PositionScheduled))
    });
}

fn bench_frame(c: &mut Criterion) {
    let msg = encode(&vessel(), MessageType::PositionScheduled).unwrap();
    c.bench_function("build_frame_type1", |b| b.iter(|| build_frame(black_box(&msg))));
}

fn bench_modulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("gmsk_modulate");
    let frame = build_frame(&encode(&vessel(), MessageType::PositionScheduled).unwrap());

    for sps in [4usize, 8, 16] {
        let modulator = GmskModulator::new(GmskConfig {
            samples_per_symbol: sps,
            ..Default::default()
        })
        .unwrap();
        group.throughput(Throughput::Elements((frame.len() * sps) as u64));
        group.bench_with_input(BenchmarkId::new("frame", sps), &sps, |b, _| {
            b.iter(|| modulator.modulate_frame(black_box(&frame)))
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let v = vessel();
    let modulator = GmskModulator::new(GmskConfig::default()).unwrap();
    c.bench_function("encode_frame_modulate", |b| {
        b.iter(|| {
            let msg = encode(black_box(&v), MessageType::PositionScheduled).unwrap();
            modulator.modulate_frame(&build_frame(&msg))
        })
    });
}

criterion_group!(benches, bench_encode, bench_frame, bench_modulate, bench_pipeline);
criterion_main!(benches);
