// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::PipelineConfig;
use peakscan_anomaly::{AnomalyReport, AnomalyScorer};
use peakscan_core::{ChannelMeta, Diagnostics, ExecutionContext, ScanError, SignalView};
use peakscan_peaks::{PeakFinder, PeakStatistics, peak_statistics};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the per-channel pipeline that produced a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Validation,
    PeakFinding,
    AnomalyScoring,
}

impl FailureStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::PeakFinding => "peak_finding",
            Self::AnomalyScoring => "anomaly_scoring",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One channel that could not be analysed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelFailure {
    pub channel: String,
    pub stage: FailureStage,
    /// Stable error code from [`ScanError::code`].
    pub code: String,
    pub message: String,
}

impl ChannelFailure {
    pub fn new(channel: impl Into<String>, stage: FailureStage, err: &ScanError) -> Self {
        Self {
            channel: channel.into(),
            stage,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == ScanError::Cancelled.code()
    }
}

impl fmt::Display for ChannelFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channel '{}' failed during {}: {}",
            self.channel, self.stage, self.message
        )
    }
}

impl std::error::Error for ChannelFailure {}

/// Peaks, verdicts and statistics for one channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelAnalysis {
    pub channel: ChannelMeta,
    pub report: AnomalyReport,
    pub peak_statistics: PeakStatistics,
    pub peak_diagnostics: Diagnostics,
}

impl ChannelAnalysis {
    pub fn peak_count(&self) -> usize {
        self.report.peaks.len()
    }

    pub fn anomaly_count(&self) -> usize {
        self.report.summary.total_anomalies
    }
}

/// Runs peak finding then anomaly scoring on one validated signal.
///
/// Configuration problems fail at the stage that owns the config, so callers
/// that skip [`PipelineConfig::validate`] still get a staged failure.
pub fn analyze_signal(
    channel: &ChannelMeta,
    signal: &SignalView<'_>,
    config: &PipelineConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<ChannelAnalysis, ChannelFailure> {
    let fail = |stage: FailureStage| {
        move |err: ScanError| ChannelFailure::new(channel.name.clone(), stage, &err)
    };

    let detection = PeakFinder::new(config.detection.clone())
        .and_then(|finder| finder.detect(signal, ctx))
        .map_err(fail(FailureStage::PeakFinding))?;

    let report = AnomalyScorer::new(config.anomaly.clone())
        .and_then(|scorer| scorer.score(signal, &detection.peaks, ctx))
        .map_err(fail(FailureStage::AnomalyScoring))?;

    tracing::debug!(
        channel = %channel.name,
        peaks = report.summary.total_peaks,
        anomalies = report.summary.total_anomalies,
        "channel analysed"
    );

    Ok(ChannelAnalysis {
        channel: channel.clone(),
        peak_statistics: peak_statistics(&detection.peaks),
        peak_diagnostics: detection.diagnostics,
        report,
    })
}
