// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod config;
pub mod detectors;
pub mod report;
mod rng;
pub mod scorer;

pub use config::{AnomalyConfig, DetectorKind, MergePolicy};
pub use detectors::{
    DetectorOutcome, IqrDetector, IsolationDetector, PeakAnomalyDetector, StatisticalDetector,
    TemporalDetector, ZscoreDetector, build_detector,
};
pub use report::{
    AnomalyReport, AnomalySummary, AnomalyVerdict, DetectorRun, DetectorStatus, ScoredPeak,
};
pub use scorer::{AnomalyScorer, score, score_with_context};

/// Anomaly scoring namespace.
pub fn crate_name() -> &'static str {
    let _ = (peakscan_core::crate_name(), peakscan_peaks::crate_name());
    "peakscan-anomaly"
}
