// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::ScanError;
use crate::control::CancelToken;
use crate::observability::{ProgressSink, TelemetrySink};
use crate::repro::ReproMode;

/// Cancellation, reproducibility and observability hooks shared by peak
/// finding, anomaly scoring and the batch driver.
///
/// The context is `Copy`; nested stages take a narrowed copy (see
/// [`ExecutionContext::without_progress`]) rather than a new one.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub cancel: Option<&'a CancelToken>,
    pub repro_mode: ReproMode,
    pub progress: Option<&'a dyn ProgressSink>,
    pub telemetry: Option<&'a dyn TelemetrySink>,
}

impl Default for ExecutionContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with safe defaults and no optional hooks.
    pub fn new() -> Self {
        Self {
            cancel: None,
            repro_mode: ReproMode::Balanced,
            progress: None,
            telemetry: None,
        }
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_repro_mode(mut self, repro_mode: ReproMode) -> Self {
        self.repro_mode = repro_mode;
        self
    }

    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_telemetry_sink(mut self, telemetry: &'a dyn TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Same context without a progress sink.
    ///
    /// Per-channel work inside a batch runs with this so only the batch
    /// reports progress, while cancellation and telemetry still reach every
    /// channel.
    pub fn without_progress(self) -> Self {
        Self {
            progress: None,
            ..self
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }

    pub fn check_cancelled(&self) -> Result<(), ScanError> {
        if self.is_cancelled() {
            return Err(ScanError::cancelled());
        }
        Ok(())
    }

    /// Polls cancellation on every `every`-th iteration of a sample or
    /// candidate loop; `every == 0` polls on every iteration.
    pub fn check_cancelled_every(&self, iteration: usize, every: usize) -> Result<(), ScanError> {
        if iteration % every.max(1) != 0 {
            return Ok(());
        }
        self.check_cancelled()
    }

    /// Reports `completed / total` units of work (detector stages, channels).
    ///
    /// Nothing is reported for an empty unit of work.
    pub fn report_completed(&self, completed: usize, total: usize) {
        if total == 0 {
            return;
        }
        self.report_progress(completed as f32 / total as f32);
    }

    /// Emits progress clamped to `[0, 1]`; non-finite fractions are dropped.
    pub fn report_progress(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }
        if let Some(sink) = self.progress {
            sink.on_progress(fraction.clamp(0.0, 1.0));
        }
    }

    pub fn record_scalar(&self, key: &'static str, value: f64) {
        if let Some(sink) = self.telemetry {
            sink.record_scalar(key, value);
        }
    }
}
