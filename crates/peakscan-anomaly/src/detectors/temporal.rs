// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use super::{DetectorOutcome, PeakAnomalyDetector, peak_gaps};
use crate::config::DetectorKind;
use peakscan_core::ScanError;
use peakscan_core::stats::{self, MEAN_ABS_DEV_CONSISTENCY, MODIFIED_Z_FACTOR};
use peakscan_peaks::PeakRecord;

/// Deviations below this fraction of the local median gap count as equal,
/// so uniformly sampled timestamps do not score on rounding noise.
const GAP_RELATIVE_TOLERANCE: f64 = 1e-9;

/// Scores irregular spacing between consecutive peaks.
///
/// Each gap gets a robust z-score against the gaps in a centred window of
/// `window` gaps. A peak's score is the largest absolute score of the gaps
/// on either side of it.
#[derive(Clone, Debug, PartialEq)]
pub struct TemporalDetector {
    pub window: usize,
    pub threshold: f64,
}

impl PeakAnomalyDetector for TemporalDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Temporal
    }

    fn evaluate(&self, peaks: &[PeakRecord]) -> Result<DetectorOutcome, ScanError> {
        if peaks.len() < 2 {
            return Err(ScanError::insufficient_data(format!(
                "temporal spacing needs at least 2 peaks; got {}",
                peaks.len()
            )));
        }

        let gaps = peak_gaps(self.kind(), peaks)?;
        let gap_scores: Vec<f64> = (0..gaps.len())
            .map(|j| self.gap_score(&gaps, j))
            .collect();

        let scores: Vec<f64> = (0..peaks.len())
            .map(|k| {
                let before = k.checked_sub(1).map(|j| gap_scores[j].abs());
                let after = gap_scores.get(k).map(|s| s.abs());
                before.into_iter().chain(after).fold(0.0, f64::max)
            })
            .collect();
        let flags = scores.iter().map(|s| *s > self.threshold).collect();
        Ok(DetectorOutcome::Scored { scores, flags })
    }
}

impl TemporalDetector {
    /// Gap indices `[start, end)` of the centred window around gap `j`.
    fn window_bounds(&self, gap_count: usize, j: usize) -> (usize, usize) {
        let width = self.window.min(gap_count);
        let start = j.saturating_sub(width / 2);
        let end = (start + width).min(gap_count);
        (end - width, end)
    }

    fn gap_score(&self, gaps: &[f64], j: usize) -> f64 {
        let (start, end) = self.window_bounds(gaps.len(), j);
        let local = &gaps[start..end];
        let Some(median) = stats::median(local) else {
            return 0.0;
        };

        let tolerance = GAP_RELATIVE_TOLERANCE * median.abs();
        let deviation = gaps[j] - median;
        if deviation.abs() <= tolerance {
            return 0.0;
        }

        let mad = stats::median_abs_deviation(local, median).unwrap_or(0.0);
        if mad > tolerance {
            return MODIFIED_Z_FACTOR * deviation / mad;
        }

        let mean_ad = stats::mean_abs_deviation(local, median).unwrap_or(0.0);
        if mean_ad > tolerance {
            deviation / (MEAN_ABS_DEV_CONSISTENCY * mean_ad)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TemporalDetector;
    use crate::detectors::test_support::peak_at;
    use crate::detectors::{DetectorOutcome, PeakAnomalyDetector};
    use peakscan_core::ScanError;
    use peakscan_peaks::PeakRecord;

    fn peaks_at_times(times: &[f64]) -> Vec<PeakRecord> {
        times
            .iter()
            .enumerate()
            .map(|(i, &t)| peak_at(i * 4 + 1, t, 1.0))
            .collect()
    }

    fn detector() -> TemporalDetector {
        TemporalDetector {
            window: 10,
            threshold: 3.5,
        }
    }

    #[test]
    fn regular_spacing_scores_zero_even_with_rounding_noise() {
        let times: Vec<f64> = (0..20).map(|i| i as f64 * 0.01).collect();
        let DetectorOutcome::Scored { scores, flags } = detector()
            .evaluate(&peaks_at_times(&times))
            .expect("regular spacing should score")
        else {
            panic!("detector should run");
        };
        assert!(scores.iter().all(|s| *s == 0.0));
        assert!(flags.iter().all(|f| !f));
    }

    #[test]
    fn long_pause_flags_both_neighbours() {
        let mut times: Vec<f64> = (0..12).map(|i| i as f64).collect();
        for t in times.iter_mut().skip(6) {
            *t += 20.0;
        }
        let DetectorOutcome::Scored { scores, flags } = detector()
            .evaluate(&peaks_at_times(&times))
            .expect("spacing should score")
        else {
            panic!("detector should run");
        };
        // Only the gap between peaks 5 and 6 deviates.
        let flagged: Vec<usize> = flags
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.then_some(i))
            .collect();
        assert_eq!(flagged, vec![5, 6]);
        assert_eq!(scores[5], scores[6]);
        assert_eq!(scores[0], 0.0);
    }

    #[test]
    fn single_peak_is_insufficient_data() {
        let err = detector()
            .evaluate(&peaks_at_times(&[1.0]))
            .expect_err("one peak has no spacing");
        assert!(matches!(err, ScanError::InsufficientData(_)));
    }

    #[test]
    fn window_bounds_stay_centred_and_clamped() {
        let detector = TemporalDetector {
            window: 4,
            threshold: 3.5,
        };
        assert_eq!(detector.window_bounds(10, 0), (0, 4));
        assert_eq!(detector.window_bounds(10, 5), (3, 7));
        assert_eq!(detector.window_bounds(10, 9), (6, 10));
        assert_eq!(detector.window_bounds(3, 1), (0, 3));
    }
}
