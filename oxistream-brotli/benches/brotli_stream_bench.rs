//! Brotli stream benchmarks
//!
//! This benchmark suite evaluates:
//! - Compression throughput at several quality levels
//! - Decompression throughput for different caller read sizes
//! - Flush cost for interactive (write, flush, write) usage

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxistream_brotli::{compress_to_vec, decoder, encoder};
use oxistream_core::{Quality, StreamConfig};
use std::hint::black_box;
use std::io::{Read, Write};

/// Text-like data
fn text_like(size: usize) -> Vec<u8> {
    let text = b"The quick brown fox jumps over the lazy dog. ";
    text.iter().copied().cycle().take(size).collect()
}

const DATA_SIZE: usize = 1024 * 1024; // 1 MB

/// Benchmark compression at different quality levels
fn bench_compress_quality(c: &mut Criterion) {
    let mut group = c.benchmark_group("brotli_compress_quality");
    group.sample_size(10);
    let data = text_like(DATA_SIZE);

    for quality in [0u32, 1, 5, 9] {
        let config = StreamConfig::new().with_quality(Quality::new(quality).unwrap());
        group.throughput(Throughput::Bytes(DATA_SIZE as u64));
        group.bench_with_input(BenchmarkId::from_parameter(quality), &data, |b, data| {
            b.iter(|| {
                let mut stream = encoder(Vec::new(), config).unwrap();
                stream.write_all(black_box(data)).unwrap();
                black_box(stream.finish().unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark decompression with different read sizes
fn bench_decompress_read_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("brotli_decompress_read_size");
    let compressed = compress_to_vec(&text_like(DATA_SIZE), StreamConfig::default()).unwrap();

    let read_sizes = [("256B", 256), ("8KB", 8 * 1024), ("64KB", 64 * 1024)];

    for (name, read_size) in read_sizes {
        group.throughput(Throughput::Bytes(DATA_SIZE as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &compressed,
            |b, compressed| {
                let mut buf = vec![0u8; read_size];
                b.iter(|| {
                    let mut stream = decoder(black_box(&compressed[..])).unwrap();
                    let mut total = 0;
                    loop {
                        let n = stream.read(&mut buf).unwrap();
                        if n == 0 {
                            break;
                        }
                        total += n;
                    }
                    black_box(total);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark small writes with a flush after each
fn bench_flush_per_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("brotli_flush_per_message");
    let message = text_like(512);
    let messages = 256;

    group.throughput(Throughput::Bytes((message.len() * messages) as u64));
    group.bench_function("512B_x256", |b| {
        b.iter(|| {
            let mut stream = encoder(Vec::new(), StreamConfig::default()).unwrap();
            for _ in 0..messages {
                stream.write_all(black_box(&message)).unwrap();
                stream.flush().unwrap();
            }
            black_box(stream.finish().unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_compress_quality,
    bench_decompress_read_size,
    bench_flush_per_message
);
criterion_main!(benches);
