// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use peakscan_anomaly::{AnomalyConfig, AnomalyScorer, DetectorKind};
use peakscan_bench::noisy_spiky_signal;
use peakscan_core::ExecutionContext;
use peakscan_peaks::{DetectionConfig, find_peaks};

fn bench_scoring(c: &mut Criterion, case_id: &str, n: usize, config: AnomalyConfig) {
    let signal = noisy_spiky_signal(n, 7).expect("synthetic signal should be valid");
    let view = signal.view();
    let peaks = find_peaks(&view, &DetectionConfig::default()).expect("peaks should be found");
    let ctx = ExecutionContext::new();
    let scorer = AnomalyScorer::new(config).expect("anomaly config should be valid");

    c.bench_function(case_id, |b| {
        b.iter(|| {
            scorer
                .score(black_box(&view), black_box(&peaks), black_box(&ctx))
                .expect("scoring benchmark should succeed");
        })
    });
}

fn benchmark_robust_detectors_n1e5(c: &mut Criterion) {
    bench_scoring(
        c,
        "score_robust_n1e5",
        100_000,
        AnomalyConfig::with_detectors([
            DetectorKind::Statistical,
            DetectorKind::Zscore,
            DetectorKind::Iqr,
            DetectorKind::Temporal,
        ]),
    );
}

fn benchmark_isolation_n1e5(c: &mut Criterion) {
    bench_scoring(
        c,
        "score_isolation_n1e5",
        100_000,
        AnomalyConfig::with_detectors([DetectorKind::Isolation]),
    );
}

criterion_group!(benches, benchmark_robust_detectors_n1e5, benchmark_isolation_n1e5);
criterion_main!(benches);
