// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use super::{DetectorOutcome, PeakAnomalyDetector, finite_values};
use crate::config::DetectorKind;
use peakscan_core::{ScanError, stats};
use peakscan_peaks::PeakRecord;

/// Classic z-score with the population standard deviation.
#[derive(Clone, Debug, PartialEq)]
pub struct ZscoreDetector {
    pub threshold: f64,
}

impl PeakAnomalyDetector for ZscoreDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Zscore
    }

    fn evaluate(&self, peaks: &[PeakRecord]) -> Result<DetectorOutcome, ScanError> {
        let values = finite_values(self.kind(), peaks)?;
        let (Some(mean), Some(std)) = (stats::mean(&values), stats::population_std(&values))
        else {
            return Ok(DetectorOutcome::not_run("no peaks to score"));
        };
        if std == 0.0 {
            return Ok(DetectorOutcome::not_run(
                "standard deviation of peak values is zero",
            ));
        }

        let scores: Vec<f64> = values.iter().map(|v| (v - mean) / std).collect();
        if let Some(position) = scores.iter().position(|s| !s.is_finite()) {
            return Err(ScanError::detector(
                self.kind().name(),
                format!("z-score overflowed at position {position}"),
            ));
        }
        let flags = scores.iter().map(|s| s.abs() > self.threshold).collect();
        Ok(DetectorOutcome::Scored { scores, flags })
    }
}

#[cfg(test)]
mod tests {
    use super::ZscoreDetector;
    use crate::detectors::test_support::peaks_from_values;
    use crate::detectors::{DetectorOutcome, PeakAnomalyDetector};

    #[test]
    fn scores_use_population_std() {
        let peaks = peaks_from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let DetectorOutcome::Scored { scores, flags } = ZscoreDetector { threshold: 1.5 }
            .evaluate(&peaks)
            .expect("finite values should score")
        else {
            panic!("detector should run");
        };
        // mean 5, population std 2
        assert_eq!(scores[0], -1.5);
        assert_eq!(scores[7], 2.0);
        assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        assert!(flags[7]);
    }

    #[test]
    fn flags_far_outlier_in_large_population() {
        let mut values = vec![10.0; 30];
        for (i, value) in values.iter_mut().enumerate() {
            *value += (i % 3) as f64 * 0.1;
        }
        values[17] = 100.0;
        let outcome = ZscoreDetector { threshold: 3.0 }
            .evaluate(&peaks_from_values(&values))
            .expect("finite values should score");
        assert_eq!(outcome.flagged_count(), 1);
    }

    #[test]
    fn constant_values_are_not_run() {
        let outcome = ZscoreDetector { threshold: 3.0 }
            .evaluate(&peaks_from_values(&[4.0; 12]))
            .expect("zero std is not an error");
        assert!(matches!(outcome, DetectorOutcome::NotRun { .. }));
    }
}
