// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use peakscan_core::ScanError;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const DEFAULT_STATISTICAL_THRESHOLD: f64 = 3.5;
const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;
const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
const DEFAULT_TEMPORAL_WINDOW: usize = 10;
const DEFAULT_ISOLATION_CONTAMINATION: f64 = 0.1;
const DEFAULT_ISOLATION_TREES: usize = 100;
const DEFAULT_ISOLATION_SAMPLE_SIZE: usize = 256;
const DEFAULT_SEED: u64 = 0;

/// Identifies one anomaly detector.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetectorKind {
    /// Median/MAD modified z-score of peak values.
    Statistical,
    /// Mean/std z-score of peak values.
    Zscore,
    /// Tukey fences on peak values.
    Iqr,
    /// Irregular spacing between consecutive peaks.
    Temporal,
    /// Isolation forest over value, prominence, width and spacing.
    Isolation,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 5] = [
        DetectorKind::Statistical,
        DetectorKind::Zscore,
        DetectorKind::Iqr,
        DetectorKind::Temporal,
        DetectorKind::Isolation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Statistical => "statistical",
            Self::Zscore => "zscore",
            Self::Iqr => "iqr",
            Self::Temporal => "temporal",
            Self::Isolation => "isolation",
        }
    }

    /// Telemetry key for this detector's flag count.
    pub fn flagged_key(self) -> &'static str {
        match self {
            Self::Statistical => "anomaly.statistical.flagged",
            Self::Zscore => "anomaly.zscore.flagged",
            Self::Iqr => "anomaly.iqr.flagged",
            Self::Temporal => "anomaly.temporal.flagged",
            Self::Isolation => "anomaly.isolation.flagged",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DetectorKind {
    type Err = ScanError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| {
                ScanError::configuration(format!(
                    "unknown anomaly detector '{raw}'; expected one of statistical, zscore, iqr, temporal, isolation"
                ))
            })
    }
}

/// How per-detector flags combine into the final verdict.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Anomalous when any evaluating detector flags the peak.
    #[default]
    Union,
    /// Anomalous when more than half of the evaluating detectors flag it.
    Majority,
}

impl MergePolicy {
    pub fn is_anomaly(self, flagged: usize, evaluated: usize) -> bool {
        match self {
            Self::Union => flagged >= 1,
            Self::Majority => flagged.saturating_mul(2) > evaluated,
        }
    }
}

/// Configuration for [`crate::AnomalyScorer`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct AnomalyConfig {
    pub enabled: BTreeSet<DetectorKind>,
    pub statistical_threshold: f64,
    pub zscore_threshold: f64,
    pub iqr_multiplier: f64,
    /// Number of gaps in the temporal detector's centred window.
    pub temporal_window: usize,
    /// Fraction of peaks the isolation detector flags, in `(0, 1)`.
    pub isolation_contamination: f64,
    pub isolation_trees: usize,
    pub isolation_sample_size: usize,
    pub seed: u64,
    pub merge_policy: MergePolicy,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            enabled: DetectorKind::ALL.into_iter().collect(),
            statistical_threshold: DEFAULT_STATISTICAL_THRESHOLD,
            zscore_threshold: DEFAULT_ZSCORE_THRESHOLD,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            temporal_window: DEFAULT_TEMPORAL_WINDOW,
            isolation_contamination: DEFAULT_ISOLATION_CONTAMINATION,
            isolation_trees: DEFAULT_ISOLATION_TREES,
            isolation_sample_size: DEFAULT_ISOLATION_SAMPLE_SIZE,
            seed: DEFAULT_SEED,
            merge_policy: MergePolicy::Union,
        }
    }
}

impl AnomalyConfig {
    /// Config with only `detectors` enabled and default parameters.
    pub fn with_detectors<I>(detectors: I) -> Self
    where
        I: IntoIterator<Item = DetectorKind>,
    {
        Self {
            enabled: detectors.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        check_positive("statistical_threshold", self.statistical_threshold)?;
        check_positive("zscore_threshold", self.zscore_threshold)?;
        check_positive("iqr_multiplier", self.iqr_multiplier)?;

        if self.temporal_window < 2 {
            return Err(ScanError::configuration(format!(
                "AnomalyConfig.temporal_window must be >= 2; got {}",
                self.temporal_window
            )));
        }

        let contamination = self.isolation_contamination;
        if !(contamination > 0.0 && contamination < 1.0) {
            return Err(ScanError::configuration(format!(
                "AnomalyConfig.isolation_contamination must be in (0, 1); got {contamination}"
            )));
        }

        if self.isolation_trees == 0 {
            return Err(ScanError::configuration(
                "AnomalyConfig.isolation_trees must be >= 1; got 0",
            ));
        }

        if self.isolation_sample_size < 2 {
            return Err(ScanError::configuration(format!(
                "AnomalyConfig.isolation_sample_size must be >= 2; got {}",
                self.isolation_sample_size
            )));
        }

        Ok(())
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), ScanError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ScanError::configuration(format!(
            "AnomalyConfig.{name} must be finite and > 0; got {value}"
        )));
    }
    Ok(())
}
