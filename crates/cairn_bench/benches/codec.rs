//! Encryption codec benchmarks.

use cairn_bench::{random_codec, random_data, size_label, SIZES};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmark one-shot sealing and opening of buffers.
fn bench_seal_open(c: &mut Criterion) {
    let codec = random_codec();
    let mut group = c.benchmark_group("seal");
    for size in SIZES {
        let data = random_data(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size_label(size)), &data, |b, data| {
            b.iter(|| black_box(codec.seal(black_box(data)).unwrap()));
        });
    }
    group.finish();

    let mut group = c.benchmark_group("open");
    for size in SIZES {
        let sealed = codec.seal(&random_data(size)).unwrap();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size_label(size)), &sealed, |b, sealed| {
            b.iter(|| black_box(codec.open(black_box(sealed)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark the streaming file pipeline in both directions.
fn bench_file_pipeline(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let codec = random_codec();
    let mut group = c.benchmark_group("file_round_trip");
    group.sample_size(20);
    for size in SIZES {
        let plain = dir.path().join(format!("plain-{size}"));
        let sealed = dir.path().join(format!("sealed-{size}"));
        let restored = dir.path().join(format!("restored-{size}"));
        std::fs::write(&plain, random_data(size)).unwrap();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(BenchmarkId::from_parameter(size_label(size)), |b| {
            b.iter(|| {
                runtime.block_on(async {
                    codec.encrypt_file(&plain, &sealed).await.unwrap();
                    codec.decrypt_file(&sealed, &restored).await.unwrap();
                });
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_seal_open, bench_file_pipeline);
criterion_main!(benches);
