//! Benchmark tests for cinestream-core operations
//!
//! Run with: cargo bench -p cinestream-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use url::Url;

use cinestream_core::handler::{is_segmented_url, HandlerError, HandlerErrorKind};
use cinestream_core::recovery::{classify, RecoveryPolicy};
use cinestream_core::resolver::CandidateSet;
use cinestream_core::types::*;

// ============================================================================
// Helpers
// ============================================================================

fn create_candidates(count: usize) -> Vec<StreamCandidate> {
    let tiers = [240, 360, 480, 720, 1080, 1440, 2160];
    (0..count)
        .map(|i| {
            let quality = tiers[(i * 5) % tiers.len()];
            let url = Url::parse(&format!(
                "https://cdn.example.com/stream/{}/{}p/index.m3u8",
                i, quality
            ))
            .unwrap();
            StreamCandidate::new(quality, url)
        })
        .collect()
}

// ============================================================================
// Resolver Benchmarks
// ============================================================================

fn bench_candidate_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("Candidate Ranking");

    for &count in &[3, 10, 50, 200] {
        let candidates = create_candidates(count);
        group.bench_with_input(
            BenchmarkId::new("CandidateSet::rank", count),
            &candidates,
            |b, candidates| {
                b.iter(|| black_box(CandidateSet::rank(candidates.clone()).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_quality_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("Quality Parse");

    for label in ["720", "1080p", " 2160p ", "auto"] {
        group.bench_with_input(BenchmarkId::new("Quality::parse", label), &label, |b, label| {
            b.iter(|| black_box(Quality::parse(label)));
        });
    }

    group.finish();
}

fn bench_url_classification(c: &mut Criterion) {
    let urls = [
        Url::parse("https://cdn.example.com/master.m3u8").unwrap(),
        Url::parse("https://cdn.example.com/movie.mp4").unwrap(),
        Url::parse("https://proxy.example.com/p?u=https%3A%2F%2Fcdn.example.com%2Fi.m3u8").unwrap(),
    ];

    c.bench_function("is_segmented_url", |b| {
        b.iter(|| {
            for url in &urls {
                black_box(is_segmented_url(url));
            }
        });
    });
}

// ============================================================================
// Recovery Benchmarks
// ============================================================================

fn bench_error_classification(c: &mut Criterion) {
    let errors = [
        HandlerError::new(HandlerErrorKind::Network, false, "manifestLoadError"),
        HandlerError::new(HandlerErrorKind::Network, true, "fragLoadError"),
        HandlerError::new(HandlerErrorKind::Media, true, "bufferAppendError"),
        HandlerError::new(HandlerErrorKind::Other, true, "internalException"),
    ];

    let mut group = c.benchmark_group("Error Classification");

    group.bench_function("classify", |b| {
        b.iter(|| {
            for err in &errors {
                black_box(classify(err));
            }
        });
    });

    group.bench_function("RecoveryPolicy::decide", |b| {
        b.iter(|| {
            let mut policy = RecoveryPolicy::new();
            for err in &errors {
                black_box(policy.decide(err));
            }
        });
    });

    group.finish();
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_format_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("Clock Formatting");

    for &seconds in &[0.0, 65.9, 3725.0, 86_399.0] {
        group.bench_with_input(
            BenchmarkId::new("format_clock", seconds as u64),
            &seconds,
            |b, &seconds| {
                b.iter(|| black_box(format_clock(seconds)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    resolver_benches,
    bench_candidate_ranking,
    bench_quality_parse,
    bench_url_classification,
);

criterion_group!(
    recovery_benches,
    bench_error_classification,
);

criterion_group!(
    format_benches,
    bench_format_clock,
);

criterion_main!(
    resolver_benches,
    recovery_benches,
    format_benches,
);
