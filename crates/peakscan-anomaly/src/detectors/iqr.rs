// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use super::{DetectorOutcome, PeakAnomalyDetector, finite_values};
use crate::config::DetectorKind;
use peakscan_core::{ScanError, stats};
use peakscan_peaks::PeakRecord;

/// Tukey fences `[Q1 - k*IQR, Q3 + k*IQR]` over peak values.
///
/// The score is the signed distance past the violated fence in IQR units
/// (raw distance when the IQR is zero) and 0 inside the fences.
#[derive(Clone, Debug, PartialEq)]
pub struct IqrDetector {
    pub multiplier: f64,
}

impl PeakAnomalyDetector for IqrDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Iqr
    }

    fn evaluate(&self, peaks: &[PeakRecord]) -> Result<DetectorOutcome, ScanError> {
        let values = finite_values(self.kind(), peaks)?;
        let sorted = stats::sorted_copy(&values);
        let (Some(q1), Some(q3)) = (
            stats::quantile_sorted(&sorted, 0.25),
            stats::quantile_sorted(&sorted, 0.75),
        ) else {
            return Ok(DetectorOutcome::not_run("no peaks to score"));
        };

        let iqr = q3 - q1;
        let lower = q1 - self.multiplier * iqr;
        let upper = q3 + self.multiplier * iqr;
        let unit = if iqr > 0.0 { iqr } else { 1.0 };

        let mut scores = Vec::with_capacity(values.len());
        let mut flags = Vec::with_capacity(values.len());
        for &v in &values {
            let (score, flagged) = if v < lower {
                (-(lower - v) / unit, true)
            } else if v > upper {
                ((v - upper) / unit, true)
            } else {
                (0.0, false)
            };
            scores.push(score);
            flags.push(flagged);
        }
        Ok(DetectorOutcome::Scored { scores, flags })
    }
}
