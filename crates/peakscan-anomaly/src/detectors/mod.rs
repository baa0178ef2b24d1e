// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

mod iqr;
mod isolation;
mod statistical;
mod temporal;
mod zscore;

pub use iqr::IqrDetector;
pub use isolation::IsolationDetector;
pub use statistical::StatisticalDetector;
pub use temporal::TemporalDetector;
pub use zscore::ZscoreDetector;

use crate::config::{AnomalyConfig, DetectorKind};
use peakscan_core::ScanError;
use peakscan_peaks::PeakRecord;

/// Result of running one detector over a peak set.
#[derive(Clone, Debug, PartialEq)]
pub enum DetectorOutcome {
    /// One score and one flag per peak, in peak order.
    Scored { scores: Vec<f64>, flags: Vec<bool> },
    /// Degenerate or insufficient input; the detector makes no claim.
    NotRun { reason: String },
}

impl DetectorOutcome {
    pub fn not_run(reason: impl Into<String>) -> Self {
        Self::NotRun {
            reason: reason.into(),
        }
    }

    pub fn flagged_count(&self) -> usize {
        match self {
            Self::Scored { flags, .. } => flags.iter().filter(|flag| **flag).count(),
            Self::NotRun { .. } => 0,
        }
    }
}

/// Contract shared by every peak anomaly detector: ordered peaks in,
/// per-peak scores and flags out.
pub trait PeakAnomalyDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn evaluate(&self, peaks: &[PeakRecord]) -> Result<DetectorOutcome, ScanError>;
}

/// Instantiates the detector for `kind` from the shared configuration.
pub fn build_detector(kind: DetectorKind, config: &AnomalyConfig) -> Box<dyn PeakAnomalyDetector> {
    match kind {
        DetectorKind::Statistical => Box::new(StatisticalDetector {
            threshold: config.statistical_threshold,
        }),
        DetectorKind::Zscore => Box::new(ZscoreDetector {
            threshold: config.zscore_threshold,
        }),
        DetectorKind::Iqr => Box::new(IqrDetector {
            multiplier: config.iqr_multiplier,
        }),
        DetectorKind::Temporal => Box::new(TemporalDetector {
            window: config.temporal_window,
            threshold: config.statistical_threshold,
        }),
        DetectorKind::Isolation => Box::new(IsolationDetector {
            contamination: config.isolation_contamination,
            trees: config.isolation_trees,
            sample_size: config.isolation_sample_size,
            seed: config.seed,
        }),
    }
}

/// Peak values, or a detector error naming the first non-finite one.
pub(crate) fn finite_values(kind: DetectorKind, peaks: &[PeakRecord]) -> Result<Vec<f64>, ScanError> {
    collect_finite(kind, "value", peaks.iter().map(|p| p.value))
}

pub(crate) fn collect_finite<I>(
    kind: DetectorKind,
    what: &str,
    values: I,
) -> Result<Vec<f64>, ScanError>
where
    I: IntoIterator<Item = f64>,
{
    let mut out = vec![];
    for (position, value) in values.into_iter().enumerate() {
        if !value.is_finite() {
            return Err(ScanError::detector(
                kind.name(),
                format!("non-finite peak {what} {value} at position {position}"),
            ));
        }
        out.push(value);
    }
    Ok(out)
}

/// Gaps between consecutive peak times; fails on non-finite times or gaps.
pub(crate) fn peak_gaps(kind: DetectorKind, peaks: &[PeakRecord]) -> Result<Vec<f64>, ScanError> {
    let times = collect_finite(kind, "time", peaks.iter().map(|p| p.time))?;
    collect_finite(kind, "gap", times.windows(2).map(|pair| pair[1] - pair[0]))
}

#[cfg(test)]
pub(crate) mod test_support {
    use peakscan_peaks::PeakRecord;

    pub fn peak_at(index: usize, time: f64, value: f64) -> PeakRecord {
        PeakRecord {
            index,
            time,
            value,
            prominence: value,
            width: 2.0,
            left_base: index.saturating_sub(2),
            right_base: index + 2,
            left_crossing: index as f64 - 1.0,
            right_crossing: index as f64 + 1.0,
        }
    }

    /// Evenly spaced peaks with the given values.
    pub fn peaks_from_values(values: &[f64]) -> Vec<PeakRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| peak_at(i * 10 + 5, (i * 10 + 5) as f64, v))
            .collect()
    }
}
