// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::analysis::{ChannelAnalysis, ChannelFailure, FailureStage, analyze_signal};
use crate::config::PipelineConfig;
use peakscan_core::{ChannelMeta, Diagnostics, ExecutionContext, ScanError, SignalView};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Raw samples for one channel as handed over by ingestion.
///
/// The samples are validated when the batch runs, so malformed channels fail
/// individually instead of aborting the whole batch.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelInput {
    pub meta: ChannelMeta,
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl ChannelInput {
    pub fn new(meta: ChannelMeta, times: Vec<f64>, values: Vec<f64>) -> Self {
        Self {
            meta,
            times,
            values,
        }
    }

    pub fn view(&self) -> Result<SignalView<'_>, ScanError> {
        SignalView::new(&self.times, &self.values)
    }
}

/// Outcome of a batch: successful analyses and failures, both in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchReport {
    pub analyses: Vec<ChannelAnalysis>,
    pub failures: Vec<ChannelFailure>,
    pub diagnostics: Diagnostics,
}

impl BatchReport {
    pub fn channel_count(&self) -> usize {
        self.analyses.len() + self.failures.len()
    }

    pub fn total_peaks(&self) -> usize {
        self.analyses.iter().map(ChannelAnalysis::peak_count).sum()
    }

    pub fn total_anomalies(&self) -> usize {
        self.analyses.iter().map(ChannelAnalysis::anomaly_count).sum()
    }

    pub fn cancelled(&self) -> bool {
        self.failures.iter().any(ChannelFailure::is_cancelled)
    }
}

/// Analyses every channel, continuing past per-channel failures.
///
/// Only an invalid `config` fails the whole batch.
pub fn analyze_batch(
    inputs: &[ChannelInput],
    config: &PipelineConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<BatchReport, ScanError> {
    config.validate()?;
    let started_at = Instant::now();
    let total = inputs.len();
    let completed = AtomicUsize::new(0);
    // Progress reports completed channels, not per-detector stages.
    let channel_ctx = ctx.without_progress();

    let run_one = |input: &ChannelInput| {
        let outcome = analyze_input(input, config, &channel_ctx);
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        ctx.report_completed(done, total);
        outcome
    };

    let parallel = can_use_parallel(ctx) && total > 1;
    let outcomes: Vec<Result<ChannelAnalysis, ChannelFailure>> = if parallel {
        run_parallel(inputs, &run_one)
    } else {
        inputs.iter().map(run_one).collect()
    };

    let mut analyses = Vec::with_capacity(total);
    let mut failures = vec![];
    for outcome in outcomes {
        match outcome {
            Ok(analysis) => analyses.push(analysis),
            Err(failure) => {
                tracing::warn!(
                    channel = %failure.channel,
                    stage = %failure.stage,
                    error = %failure.message,
                    "channel failed"
                );
                failures.push(failure);
            }
        }
    }

    let thread_count = if parallel { worker_threads() } else { 1 };
    let mut diagnostics = Diagnostics {
        n: total,
        algorithm: Cow::Borrowed("batch"),
        seed: Some(config.anomaly.seed),
        repro_mode: ctx.repro_mode,
        thread_count: Some(thread_count),
        warnings: failures.iter().map(ToString::to_string).collect(),
        ..Diagnostics::default()
    };
    diagnostics.notes.push(format!(
        "channels={total}, analysed={}, failed={}",
        analyses.len(),
        failures.len()
    ));
    diagnostics.params_json = serde_json::to_value(config).ok();
    diagnostics.runtime_ms =
        Some(u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX));

    ctx.record_scalar("batch.channels", total as f64);
    ctx.record_scalar("batch.failures", failures.len() as f64);
    tracing::debug!(
        channels = total,
        failures = failures.len(),
        threads = thread_count,
        "batch complete"
    );

    Ok(BatchReport {
        analyses,
        failures,
        diagnostics,
    })
}

fn analyze_input(
    input: &ChannelInput,
    config: &PipelineConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<ChannelAnalysis, ChannelFailure> {
    let view = input.view().map_err(|err| {
        ChannelFailure::new(input.meta.name.clone(), FailureStage::Validation, &err)
    })?;
    analyze_signal(&input.meta, &view, config, ctx)
}

#[cfg(feature = "rayon")]
fn can_use_parallel(ctx: &ExecutionContext<'_>) -> bool {
    ctx.repro_mode.allows_parallel()
}

#[cfg(not(feature = "rayon"))]
fn can_use_parallel(_ctx: &ExecutionContext<'_>) -> bool {
    false
}

#[cfg(feature = "rayon")]
fn run_parallel<F>(inputs: &[ChannelInput], run_one: &F) -> Vec<Result<ChannelAnalysis, ChannelFailure>>
where
    F: Fn(&ChannelInput) -> Result<ChannelAnalysis, ChannelFailure> + Sync,
{
    inputs.par_iter().map(run_one).collect()
}

#[cfg(not(feature = "rayon"))]
fn run_parallel<F>(inputs: &[ChannelInput], run_one: &F) -> Vec<Result<ChannelAnalysis, ChannelFailure>>
where
    F: Fn(&ChannelInput) -> Result<ChannelAnalysis, ChannelFailure> + Sync,
{
    inputs.iter().map(run_one).collect()
}

#[cfg(feature = "rayon")]
fn worker_threads() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "rayon"))]
fn worker_threads() -> usize {
    1
}
