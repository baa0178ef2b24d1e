// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use super::{DetectorOutcome, PeakAnomalyDetector, finite_values};
use crate::config::DetectorKind;
use peakscan_core::ScanError;
use peakscan_core::stats::{self, MODIFIED_Z_FACTOR};
use peakscan_peaks::PeakRecord;

/// Modified z-score `0.6745 (v - median) / MAD` over peak values.
#[derive(Clone, Debug, PartialEq)]
pub struct StatisticalDetector {
    pub threshold: f64,
}

impl PeakAnomalyDetector for StatisticalDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Statistical
    }

    fn evaluate(&self, peaks: &[PeakRecord]) -> Result<DetectorOutcome, ScanError> {
        let values = finite_values(self.kind(), peaks)?;
        let Some(median) = stats::median(&values) else {
            return Ok(DetectorOutcome::not_run("no peaks to score"));
        };
        let mad = stats::median_abs_deviation(&values, median).unwrap_or(0.0);
        if mad == 0.0 {
            return Ok(DetectorOutcome::not_run(
                "median absolute deviation of peak values is zero",
            ));
        }

        let scores: Vec<f64> = values
            .iter()
            .map(|v| MODIFIED_Z_FACTOR * (v - median) / mad)
            .collect();
        if let Some(position) = scores.iter().position(|s| !s.is_finite()) {
            return Err(ScanError::detector(
                self.kind().name(),
                format!("modified z-score overflowed at position {position}"),
            ));
        }
        let flags = scores.iter().map(|s| s.abs() > self.threshold).collect();
        Ok(DetectorOutcome::Scored { scores, flags })
    }
}
