//! Diff engine benchmarks.

use bansync_bench::{churned_pair, text_records};
use bansync_core::{BanDiff, RecordSet};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmark diffing sets of growing size at a fixed churn.
fn bench_diff_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_size");

    for size in [100, 1_000, 10_000, 100_000] {
        let (old, new) = churned_pair(size, 5);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(BanDiff::between(black_box(&old), black_box(&new))));
        });
    }

    group.finish();
}

/// Benchmark diffing at different churn rates.
fn bench_diff_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_churn");

    for churn in [0, 1, 10, 50, 100] {
        let (old, new) = churned_pair(10_000, churn);
        group.bench_with_input(BenchmarkId::from_parameter(churn), &churn, |b, _| {
            b.iter(|| black_box(BanDiff::between(black_box(&old), black_box(&new))));
        });
    }

    group.finish();
}

/// Benchmark the no-op diff, the common case on every cycle.
fn bench_diff_identical(c: &mut Criterion) {
    let set: RecordSet = text_records(10_000).into_iter().collect();
    c.bench_function("diff_identical_text_10000", |b| {
        b.iter(|| black_box(BanDiff::between(black_box(&set), black_box(&set)).is_empty()));
    });
}

/// Benchmark building a record set from rows.
fn bench_collect(c: &mut Criterion) {
    let rows = text_records(10_000);
    c.bench_function("collect_text_10000", |b| {
        b.iter(|| black_box(rows.iter().cloned().collect::<RecordSet>()));
    });
}

criterion_group!(
    benches,
    bench_diff_size,
    bench_diff_churn,
    bench_diff_identical,
    bench_collect
);
criterion_main!(benches);
