// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use peakscan_core::{ScanError, SignalView, stats};

/// How `min_height` and `min_prominence` are interpreted.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThresholdScale {
    /// Thresholds are in signal units.
    #[default]
    Absolute,
    /// Thresholds are multiples of the signal's standard deviation:
    /// height becomes `mean + min_height * std`, prominence becomes
    /// `min_prominence * std`.
    SignalStd,
}

/// Accepted peak width in samples, measured at half prominence.
///
/// `max: None` leaves the range unbounded above.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidthRange {
    pub min: f64,
    pub max: Option<f64>,
}

impl Default for WidthRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl WidthRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub fn unbounded() -> Self {
        Self { min: 0.0, max: None }
    }

    pub fn upper(&self) -> f64 {
        self.max.unwrap_or(f64::INFINITY)
    }

    pub fn contains(&self, width: f64) -> bool {
        width >= self.min && width <= self.upper()
    }
}

/// Configuration for [`crate::PeakFinder`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionConfig {
    /// Minimum accepted peak value; `None` disables the height filter.
    pub min_height: Option<f64>,
    /// Minimum index separation between accepted peaks.
    pub min_distance: usize,
    pub min_prominence: f64,
    pub width_range: WidthRange,
    pub threshold_scale: ThresholdScale,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_height: None,
            min_distance: 1,
            min_prominence: 0.0,
            width_range: WidthRange::default(),
            threshold_scale: ThresholdScale::Absolute,
        }
    }
}

/// Thresholds after applying [`ThresholdScale`] to a concrete signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedThresholds {
    pub height: Option<f64>,
    pub prominence: f64,
}

impl DetectionConfig {
    /// Rejects out-of-range settings. Values are never clamped.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.min_distance < 1 {
            return Err(ScanError::configuration(
                "DetectionConfig.min_distance must be >= 1; got 0",
            ));
        }

        if let Some(height) = self.min_height
            && height.is_nan()
        {
            return Err(ScanError::configuration(
                "DetectionConfig.min_height must not be NaN",
            ));
        }

        if self.min_prominence.is_nan() || self.min_prominence < 0.0 {
            return Err(ScanError::configuration(format!(
                "DetectionConfig.min_prominence must be >= 0; got {}",
                self.min_prominence
            )));
        }

        let WidthRange { min, max } = self.width_range;
        if min.is_nan() || min < 0.0 {
            return Err(ScanError::configuration(format!(
                "DetectionConfig.width_range.min must be >= 0; got {min}"
            )));
        }
        if let Some(max) = max {
            if max.is_nan() {
                return Err(ScanError::configuration(
                    "DetectionConfig.width_range.max must not be NaN",
                ));
            }
            if min > max {
                return Err(ScanError::configuration(format!(
                    "DetectionConfig.width_range.min must be <= max; got min={min}, max={max}"
                )));
            }
        }

        Ok(())
    }

    /// Resolves the effective height and prominence thresholds for `signal`.
    ///
    /// Under [`ThresholdScale::SignalStd`] the statistics use finite samples
    /// only; a signal without finite samples resolves to mean and std of 0.
    pub fn resolve(&self, signal: &SignalView<'_>) -> ResolvedThresholds {
        match self.threshold_scale {
            ThresholdScale::Absolute => ResolvedThresholds {
                height: self.min_height,
                prominence: self.min_prominence,
            },
            ThresholdScale::SignalStd => {
                let finite: Vec<f64> = signal.finite_values().collect();
                let mean = stats::mean(&finite).unwrap_or(0.0);
                let std = stats::population_std(&finite).unwrap_or(0.0);
                ResolvedThresholds {
                    height: self.min_height.map(|k| mean + k * std),
                    prominence: self.min_prominence * std,
                }
            }
        }
    }
}
