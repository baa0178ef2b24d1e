// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::{DetectorKind, MergePolicy};
use peakscan_core::Diagnostics;
use peakscan_peaks::PeakRecord;
use std::collections::{BTreeMap, BTreeSet};

/// Merged anomaly decision for one peak.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnomalyVerdict {
    pub flagged_by: BTreeSet<DetectorKind>,
    /// Detectors that produced a verdict for this peak.
    pub evaluated_by: BTreeSet<DetectorKind>,
    /// Raw score from every detector that evaluated the peak.
    pub scores: BTreeMap<DetectorKind, f64>,
    pub is_anomaly: bool,
    /// `|flagged_by| / |evaluated_by|`, 0 when nothing evaluated the peak.
    pub confidence: f64,
}

impl AnomalyVerdict {
    pub(crate) fn record(&mut self, detector: DetectorKind, score: f64, flagged: bool) {
        self.evaluated_by.insert(detector);
        self.scores.insert(detector, score);
        if flagged {
            self.flagged_by.insert(detector);
        }
    }

    pub(crate) fn finalize(&mut self, policy: MergePolicy) {
        let flagged = self.flagged_by.len();
        let evaluated = self.evaluated_by.len();
        self.confidence = if evaluated == 0 {
            0.0
        } else {
            flagged as f64 / evaluated as f64
        };
        self.is_anomaly = evaluated > 0 && policy.is_anomaly(flagged, evaluated);
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredPeak {
    pub peak: PeakRecord,
    pub verdict: AnomalyVerdict,
}

/// What happened when a detector was asked to score the peak set.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
#[derive(Clone, Debug, PartialEq)]
pub enum DetectorRun {
    Ran { flagged: usize },
    NotRun { reason: String },
    Errored { message: String },
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorStatus {
    pub detector: DetectorKind,
    pub run: DetectorRun,
}

/// Counts across one scored peak set.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnomalySummary {
    pub total_peaks: usize,
    pub total_anomalies: usize,
    pub anomaly_rate: f64,
    pub flagged_per_detector: BTreeMap<DetectorKind, usize>,
    pub mean_confidence: f64,
    pub max_confidence: f64,
}

impl AnomalySummary {
    pub fn from_scored(peaks: &[ScoredPeak]) -> Self {
        let total_peaks = peaks.len();
        if total_peaks == 0 {
            return Self::default();
        }

        let mut flagged_per_detector = BTreeMap::new();
        for detector in peaks.iter().flat_map(|p| p.verdict.flagged_by.iter()) {
            *flagged_per_detector.entry(*detector).or_insert(0) += 1;
        }

        let total_anomalies = peaks.iter().filter(|p| p.verdict.is_anomaly).count();
        let confidence_sum: f64 = peaks.iter().map(|p| p.verdict.confidence).sum();
        let max_confidence = peaks
            .iter()
            .map(|p| p.verdict.confidence)
            .fold(0.0, f64::max);

        Self {
            total_peaks,
            total_anomalies,
            anomaly_rate: total_anomalies as f64 / total_peaks as f64,
            flagged_per_detector,
            mean_confidence: confidence_sum / total_peaks as f64,
            max_confidence,
        }
    }
}

/// Scored peaks, per-detector run status and summary for one signal.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AnomalyReport {
    pub peaks: Vec<ScoredPeak>,
    pub detectors: Vec<DetectorStatus>,
    pub summary: AnomalySummary,
    pub warnings: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl AnomalyReport {
    pub fn anomalies(&self) -> impl Iterator<Item = &ScoredPeak> {
        self.peaks.iter().filter(|p| p.verdict.is_anomaly)
    }

    pub fn detector_run(&self, detector: DetectorKind) -> Option<&DetectorRun> {
        self.detectors
            .iter()
            .find(|status| status.detector == detector)
            .map(|status| &status.run)
    }
}

#[cfg(test)]
mod tests {
    use super::{AnomalySummary, AnomalyVerdict, ScoredPeak};
    use crate::config::{DetectorKind, MergePolicy};
    use peakscan_peaks::PeakRecord;

    fn peak(index: usize) -> PeakRecord {
        PeakRecord {
            index,
            time: index as f64,
            value: 1.0,
            prominence: 1.0,
            width: 1.0,
            left_base: index,
            right_base: index,
            left_crossing: index as f64,
            right_crossing: index as f64 + 1.0,
        }
    }

    #[test]
    fn confidence_normalizes_by_evaluating_detectors() {
        let mut verdict = AnomalyVerdict::default();
        verdict.record(DetectorKind::Statistical, 5.0, true);
        verdict.record(DetectorKind::Zscore, 1.0, false);
        verdict.record(DetectorKind::Iqr, 2.0, true);
        verdict.finalize(MergePolicy::Union);
        assert!(verdict.is_anomaly);
        assert!((verdict.confidence - 2.0 / 3.0).abs() < 1e-12);

        verdict.finalize(MergePolicy::Majority);
        assert!(verdict.is_anomaly);

        let mut lone = AnomalyVerdict::default();
        lone.record(DetectorKind::Iqr, 0.0, false);
        lone.record(DetectorKind::Temporal, 4.0, true);
        lone.finalize(MergePolicy::Majority);
        assert!(!lone.is_anomaly);
        assert_eq!(lone.confidence, 0.5);
    }

    #[test]
    fn empty_verdict_has_zero_confidence() {
        let mut verdict = AnomalyVerdict::default();
        verdict.finalize(MergePolicy::Union);
        assert_eq!(verdict.confidence, 0.0);
        assert!(!verdict.is_anomaly);
    }

    #[test]
    fn summary_counts_flags_and_confidence() {
        let mut flagged = AnomalyVerdict::default();
        flagged.record(DetectorKind::Statistical, 9.0, true);
        flagged.record(DetectorKind::Iqr, 3.0, true);
        flagged.finalize(MergePolicy::Union);
        let mut clean = AnomalyVerdict::default();
        clean.record(DetectorKind::Statistical, 0.1, false);
        clean.record(DetectorKind::Iqr, 0.0, false);
        clean.finalize(MergePolicy::Union);

        let summary = AnomalySummary::from_scored(&[
            ScoredPeak {
                peak: peak(3),
                verdict: flagged,
            },
            ScoredPeak {
                peak: peak(9),
                verdict: clean,
            },
        ]);
        assert_eq!(summary.total_peaks, 2);
        assert_eq!(summary.total_anomalies, 1);
        assert_eq!(summary.anomaly_rate, 0.5);
        assert_eq!(summary.flagged_per_detector.get(&DetectorKind::Iqr), Some(&1));
        assert_eq!(summary.flagged_per_detector.get(&DetectorKind::Zscore), None);
        assert_eq!(summary.mean_confidence, 0.5);
        assert_eq!(summary.max_confidence, 1.0);

        assert_eq!(AnomalySummary::from_scored(&[]), AnomalySummary::default());
    }
}
