// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::AnomalyConfig;
use crate::detectors::{DetectorOutcome, build_detector};
use crate::report::{
    AnomalyReport, AnomalySummary, AnomalyVerdict, DetectorRun, DetectorStatus, ScoredPeak,
};
use peakscan_core::{Diagnostics, ExecutionContext, ScanError, SignalView};
use peakscan_peaks::PeakRecord;
use std::borrow::Cow;
use std::time::Instant;

/// Runs the enabled detectors over a peak set and merges their verdicts.
#[derive(Clone, Debug)]
pub struct AnomalyScorer {
    config: AnomalyConfig,
}

impl AnomalyScorer {
    pub fn new(config: AnomalyConfig) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    pub fn score(
        &self,
        signal: &SignalView<'_>,
        peaks: &[PeakRecord],
        ctx: &ExecutionContext<'_>,
    ) -> Result<AnomalyReport, ScanError> {
        let started_at = Instant::now();
        validate_peaks(signal, peaks)?;

        let mut verdicts = vec![AnomalyVerdict::default(); peaks.len()];
        let mut detectors = Vec::with_capacity(self.config.enabled.len());
        let mut warnings = vec![];
        let stage_count = self.config.enabled.len();

        for (stage, &kind) in self.config.enabled.iter().enumerate() {
            ctx.check_cancelled()?;

            let run = if peaks.is_empty() {
                DetectorRun::NotRun {
                    reason: "no peaks to score".to_string(),
                }
            } else {
                match build_detector(kind, &self.config).evaluate(peaks) {
                    Ok(DetectorOutcome::Scored { scores, flags }) => {
                        let mut flagged = 0;
                        for ((verdict, score), flag) in
                            verdicts.iter_mut().zip(scores).zip(flags)
                        {
                            verdict.record(kind, score, flag);
                            flagged += usize::from(flag);
                        }
                        ctx.record_scalar(kind.flagged_key(), flagged as f64);
                        DetectorRun::Ran { flagged }
                    }
                    Ok(DetectorOutcome::NotRun { reason })
                    | Err(ScanError::InsufficientData(reason)) => {
                        tracing::debug!(detector = kind.name(), %reason, "detector not run");
                        DetectorRun::NotRun { reason }
                    }
                    Err(err) => {
                        tracing::warn!(detector = kind.name(), error = %err, "detector failed");
                        warnings.push(err.to_string());
                        DetectorRun::Errored {
                            message: err.to_string(),
                        }
                    }
                }
            };

            detectors.push(DetectorStatus {
                detector: kind,
                run,
            });
            ctx.report_completed(stage + 1, stage_count);
        }

        let scored: Vec<ScoredPeak> = peaks
            .iter()
            .cloned()
            .zip(verdicts)
            .map(|(peak, mut verdict)| {
                verdict.finalize(self.config.merge_policy);
                ScoredPeak { peak, verdict }
            })
            .collect();
        let summary = AnomalySummary::from_scored(&scored);
        ctx.record_scalar("anomaly.total", summary.total_anomalies as f64);

        let mut diagnostics = Diagnostics {
            n: signal.len(),
            algorithm: Cow::Borrowed("anomaly_ensemble"),
            seed: Some(self.config.seed),
            repro_mode: ctx.repro_mode,
            warnings: warnings.clone(),
            ..Diagnostics::default()
        };
        diagnostics.notes.push(format!(
            "merge_policy={:?}, enabled=[{}], peaks={}",
            self.config.merge_policy,
            self.config
                .enabled
                .iter()
                .map(|kind| kind.name())
                .collect::<Vec<_>>()
                .join(","),
            peaks.len()
        ));
        #[cfg(feature = "serde")]
        {
            diagnostics.params_json = serde_json::to_value(&self.config).ok();
        }
        diagnostics.runtime_ms =
            Some(u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX));

        tracing::debug!(
            peaks = summary.total_peaks,
            anomalies = summary.total_anomalies,
            "anomaly scoring complete"
        );

        Ok(AnomalyReport {
            peaks: scored,
            detectors,
            summary,
            warnings,
            diagnostics,
        })
    }
}

/// Scores `peaks` with a default execution context.
pub fn score(
    signal: &SignalView<'_>,
    peaks: &[PeakRecord],
    config: &AnomalyConfig,
) -> Result<AnomalyReport, ScanError> {
    score_with_context(signal, peaks, config, &ExecutionContext::new())
}

/// Scores `peaks`, checking cancellation between detector stages.
pub fn score_with_context(
    signal: &SignalView<'_>,
    peaks: &[PeakRecord],
    config: &AnomalyConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<AnomalyReport, ScanError> {
    AnomalyScorer::new(config.clone())?.score(signal, peaks, ctx)
}

fn validate_peaks(signal: &SignalView<'_>, peaks: &[PeakRecord]) -> Result<(), ScanError> {
    if let Some((position, peak)) = peaks
        .iter()
        .enumerate()
        .find(|(_, peak)| peak.index >= signal.len())
    {
        return Err(ScanError::invalid_input(format!(
            "peak at position {position} has index {} outside a signal of {} samples",
            peak.index,
            signal.len()
        )));
    }
    Ok(())
}
