// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::finder::PeakRecord;
use peakscan_core::ScanError;

/// Post-detection selection criteria. Every bound is inclusive and optional.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeakCriteria {
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
    pub min_prominence: Option<f64>,
    /// Closed `(start, end)` time window.
    pub time_range: Option<(f64, f64)>,
}

impl PeakCriteria {
    pub fn validate(&self) -> Result<(), ScanError> {
        check_bounds("height", self.min_height, self.max_height)?;
        check_bounds("width", self.min_width, self.max_width)?;
        check_bounds("prominence", self.min_prominence, None)?;
        if let Some((start, end)) = self.time_range {
            check_bounds("time_range", Some(start), Some(end))?;
        }
        Ok(())
    }

    pub fn matches(&self, peak: &PeakRecord) -> bool {
        within(peak.value, self.min_height, self.max_height)
            && within(peak.width, self.min_width, self.max_width)
            && within(peak.prominence, self.min_prominence, None)
            && self
                .time_range
                .is_none_or(|(start, end)| within(peak.time, Some(start), Some(end)))
    }
}

fn check_bounds(name: &str, min: Option<f64>, max: Option<f64>) -> Result<(), ScanError> {
    if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) {
        return Err(ScanError::configuration(format!(
            "PeakCriteria.{name} bounds must not be NaN"
        )));
    }
    if let (Some(lo), Some(hi)) = (min, max)
        && lo > hi
    {
        return Err(ScanError::configuration(format!(
            "PeakCriteria.{name} lower bound must be <= upper bound; got {lo} > {hi}"
        )));
    }
    Ok(())
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_none_or(|lo| value >= lo) && max.is_none_or(|hi| value <= hi)
}

/// Keeps the peaks matching `criteria`, preserving order.
pub fn filter_peaks(
    peaks: &[PeakRecord],
    criteria: &PeakCriteria,
) -> Result<Vec<PeakRecord>, ScanError> {
    criteria.validate()?;
    Ok(peaks
        .iter()
        .filter(|peak| criteria.matches(peak))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{PeakCriteria, filter_peaks};
    use crate::finder::PeakRecord;
    use peakscan_core::ScanError;

    fn peak(index: usize, value: f64, width: f64, prominence: f64) -> PeakRecord {
        PeakRecord {
            index,
            time: index as f64 * 0.1,
            value,
            prominence,
            width,
            left_base: index.saturating_sub(1),
            right_base: index + 1,
            left_crossing: index as f64 - width / 2.0,
            right_crossing: index as f64 + width / 2.0,
        }
    }

    fn sample() -> Vec<PeakRecord> {
        vec![
            peak(10, 1.0, 4.0, 0.5),
            peak(20, 3.0, 8.0, 2.0),
            peak(30, 5.0, 12.0, 4.5),
            peak(40, 7.0, 2.0, 6.0),
        ]
    }

    fn kept(criteria: &PeakCriteria) -> Vec<usize> {
        filter_peaks(&sample(), criteria)
            .expect("criteria should be valid")
            .iter()
            .map(|p| p.index)
            .collect()
    }

    #[test]
    fn default_criteria_keep_everything() {
        assert_eq!(kept(&PeakCriteria::default()), vec![10, 20, 30, 40]);
    }

    #[test]
    fn bounds_are_inclusive_and_combine() {
        let criteria = PeakCriteria {
            min_height: Some(3.0),
            max_width: Some(12.0),
            ..PeakCriteria::default()
        };
        assert_eq!(kept(&criteria), vec![20, 30, 40]);

        let criteria = PeakCriteria {
            min_width: Some(4.0),
            min_prominence: Some(2.0),
            ..PeakCriteria::default()
        };
        assert_eq!(kept(&criteria), vec![20, 30]);

        let criteria = PeakCriteria {
            max_height: Some(5.0),
            time_range: Some((1.5, 3.5)),
            ..PeakCriteria::default()
        };
        assert_eq!(kept(&criteria), vec![20, 30]);
    }

    #[test]
    fn inverted_or_nan_bounds_are_configuration_errors() {
        let inverted = PeakCriteria {
            min_height: Some(5.0),
            max_height: Some(1.0),
            ..PeakCriteria::default()
        };
        let err = filter_peaks(&sample(), &inverted).expect_err("inverted bounds");
        assert!(matches!(err, ScanError::Configuration(_)));
        assert!(err.to_string().contains("height"));

        let nan_window = PeakCriteria {
            time_range: Some((f64::NAN, 1.0)),
            ..PeakCriteria::default()
        };
        assert!(filter_peaks(&sample(), &nan_window).is_err());
    }
}
