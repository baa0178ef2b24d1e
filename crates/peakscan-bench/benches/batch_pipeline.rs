// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use peakscan_bench::noisy_spiky_values;
use peakscan_core::{ChannelMeta, ExecutionContext, ReproMode};
use peakscan_pipeline::{ChannelInput, PipelineConfig, analyze_batch};

fn channels(count: usize, n: usize) -> Vec<ChannelInput> {
    let times: Vec<f64> = (0..n).map(|i| i as f64 * 1e-3).collect();
    (0..count)
        .map(|k| {
            ChannelInput::new(
                ChannelMeta::new(format!("ch{k}")),
                times.clone(),
                noisy_spiky_values(n, k as u64 + 1),
            )
        })
        .collect()
}

fn bench_batch(c: &mut Criterion, case_id: &str, repro_mode: ReproMode) {
    let inputs = channels(16, 50_000);
    let config = PipelineConfig::default();
    let ctx = ExecutionContext::new().with_repro_mode(repro_mode);

    c.bench_function(case_id, |b| {
        b.iter(|| {
            analyze_batch(black_box(&inputs), black_box(&config), black_box(&ctx))
                .expect("batch benchmark should succeed");
        })
    });
}

fn benchmark_batch_sequential(c: &mut Criterion) {
    bench_batch(c, "batch_16x5e4_sequential", ReproMode::Strict);
}

fn benchmark_batch_parallel(c: &mut Criterion) {
    bench_batch(c, "batch_16x5e4_parallel", ReproMode::Balanced);
}

criterion_group!(benches, benchmark_batch_sequential, benchmark_batch_parallel);
criterion_main!(benches);
