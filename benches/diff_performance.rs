//! Performance benchmarks for pollwatch change detection.
//!
//! - Diff cost for documents of growing size with a handful of edits
//! - Tracker round trip (diff plus snapshot update) for unchanged content

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use pollwatch::prelude::*;

fn document(lines: usize, edit_every: usize, tag: &str) -> String {
    (0..lines)
        .map(|i| {
            if edit_every > 0 && i % edit_every == 0 {
                format!("line {} edited {}\n", i, tag)
            } else {
                format!("  line {}\n", i)
            }
        })
        .collect()
}

/// Benchmark diffing documents with scattered edits
fn benchmark_trimmed_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("trimmed_diff");

    for lines in [100, 1_000, 10_000] {
        let previous = document(lines, 50, "old");
        let current = document(lines, 50, "new");

        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::new("scattered_edits", lines), &lines, |b, _| {
            b.iter(|| black_box(TrimmedLineDiff.diff(&previous, &current)));
        });
    }

    group.finish();
}

/// Benchmark diffing content that only differs in whitespace
fn benchmark_whitespace_only(c: &mut Criterion) {
    let previous = document(10_000, 0, "");
    let current: String = previous.lines().map(|line| format!("{}\t\n", line.trim())).collect();

    let mut group = c.benchmark_group("whitespace_only");
    group.bench_function("10000_lines", |b| {
        b.iter(|| {
            let diff = TrimmedLineDiff.diff(&previous, &current);
            black_box(diff.has_changes());
        });
    });
    group.finish();
}

/// Benchmark the tracker's diff-and-update path
fn benchmark_tracker(c: &mut Criterion) {
    let body = document(1_000, 0, "");
    let resource = Resource::from("https://example.com/status");
    let mut tracker: ChangeTracker = ChangeTracker::new();
    tracker.diff_and_update(&resource, &body);

    let mut group = c.benchmark_group("tracker");
    group.bench_function("unchanged_1000_lines", |b| {
        b.iter(|| black_box(tracker.diff_and_update(&resource, &body)));
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_trimmed_diff,
    benchmark_whitespace_only,
    benchmark_tracker
);
criterion_main!(benches);
