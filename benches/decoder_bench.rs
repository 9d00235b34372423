//! Performance benchmarks for FrameDecoder.
//!
//! A 2400 baud reader delivers about 240 bytes per second, so the decoder is
//! never the bottleneck. These benchmarks exist to catch accidental
//! quadratic behavior in the per-byte matching.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench decoder_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use latchkey_protocol::FrameDecoder;
use std::hint::black_box;

/// Benchmark decoding a single clean frame byte by byte.
fn bench_single_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_frame");
    group.throughput(Throughput::Elements(1));

    let frame = b"\n0004567890\r";

    group.bench_function("feed_clean_frame", |b| {
        let mut decoder = FrameDecoder::new();
        b.iter(|| {
            decoder.reset();
            let code = decoder.feed_slice(black_box(frame));
            black_box(code);
        });
    });

    group.finish();
}

/// Benchmark frames preceded by growing amounts of noise.
fn bench_noisy_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("noisy_frames");

    for noise_len in [0usize, 10, 25, 100] {
        let mut input = vec![b'#'; noise_len];
        input.extend_from_slice(b"\n12345\r");
        group.throughput(Throughput::Bytes(input.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(noise_len),
            &input,
            |b, input| {
                let mut decoder = FrameDecoder::new();
                b.iter(|| {
                    decoder.reset();
                    black_box(decoder.feed_slice(black_box(input)));
                });
            },
        );
    }

    group.finish();
}

/// Benchmark a reader that never terminates its frames.
fn bench_overflow_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("overflow_stream");
    let input = vec![b'7'; 4096];
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("feed_4k_without_terminator", |b| {
        let mut decoder = FrameDecoder::new();
        b.iter(|| {
            black_box(decoder.feed_slice(black_box(&input)));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_frame,
    bench_noisy_frames,
    bench_overflow_stream,
);

criterion_main!(benches);
