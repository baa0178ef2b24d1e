// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::finder::PeakRecord;
use peakscan_core::stats;

/// Mean, population std and range of one peak metric.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricSummary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricSummary {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        Self {
            mean: stats::mean(values).unwrap_or(0.0),
            std: stats::population_std(values).unwrap_or(0.0),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Aggregate description of a peak set.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PeakStatistics {
    pub count: usize,
    pub height: MetricSummary,
    pub width: MetricSummary,
    pub prominence: MetricSummary,
    /// Peaks per time unit between the first and last peak; 0 for a zero span.
    pub peak_rate: f64,
}

pub fn peak_statistics(peaks: &[PeakRecord]) -> PeakStatistics {
    let (Some(first), Some(last)) = (peaks.first(), peaks.last()) else {
        return PeakStatistics::default();
    };

    let heights: Vec<f64> = peaks.iter().map(|p| p.value).collect();
    let widths: Vec<f64> = peaks.iter().map(|p| p.width).collect();
    let prominences: Vec<f64> = peaks.iter().map(|p| p.prominence).collect();

    let span = last.time - first.time;
    let peak_rate = if span > 0.0 && span.is_finite() {
        peaks.len() as f64 / span
    } else {
        0.0
    };

    PeakStatistics {
        count: peaks.len(),
        height: MetricSummary::from_values(&heights),
        width: MetricSummary::from_values(&widths),
        prominence: MetricSummary::from_values(&prominences),
        peak_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::{PeakStatistics, peak_statistics};
    use crate::finder::PeakRecord;

    fn peak(index: usize, time: f64, value: f64, width: f64, prominence: f64) -> PeakRecord {
        PeakRecord {
            index,
            time,
            value,
            prominence,
            width,
            left_base: index,
            right_base: index,
            left_crossing: index as f64,
            right_crossing: index as f64 + width,
        }
    }

    #[test]
    fn empty_input_yields_zeroed_statistics() {
        assert_eq!(peak_statistics(&[]), PeakStatistics::default());
    }

    #[test]
    fn summaries_and_rate() {
        let peaks = [
            peak(0, 1.0, 2.0, 1.0, 1.0),
            peak(5, 2.0, 4.0, 3.0, 2.0),
            peak(9, 3.0, 6.0, 5.0, 6.0),
        ];
        let summary = peak_statistics(&peaks);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.height.mean, 4.0);
        assert_eq!(summary.height.min, 2.0);
        assert_eq!(summary.height.max, 6.0);
        assert!((summary.height.std - (8.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(summary.width.mean, 3.0);
        assert_eq!(summary.prominence.max, 6.0);
        assert_eq!(summary.peak_rate, 1.5);
    }

    #[test]
    fn single_peak_has_zero_rate_and_zero_spread() {
        let summary = peak_statistics(&[peak(3, 0.3, 9.0, 2.0, 4.0)]);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.peak_rate, 0.0);
        assert_eq!(summary.height.std, 0.0);
        assert_eq!(summary.height.min, summary.height.max);
    }
}
