// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::ScanError;

/// Pass-through metadata describing where a signal came from.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelMeta {
    pub name: String,
    pub unit: Option<String>,
}

impl ChannelMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Zero-copy view over parallel time and value buffers.
///
/// Times are non-NaN and non-decreasing. Values may hold NaN or infinities;
/// the peak finder never reports those samples as peaks.
#[derive(Clone, Copy, Debug)]
pub struct SignalView<'a> {
    times: &'a [f64],
    values: &'a [f64],
}

impl<'a> SignalView<'a> {
    /// Constructs a validated `SignalView`.
    pub fn new(times: &'a [f64], values: &'a [f64]) -> Result<Self, ScanError> {
        if times.len() != values.len() {
            return Err(ScanError::invalid_input(format!(
                "time/value length mismatch: times={}, values={}",
                times.len(),
                values.len()
            )));
        }

        if let Some(idx) = times.iter().position(|t| t.is_nan()) {
            return Err(ScanError::invalid_input(format!(
                "time at index {idx} is NaN"
            )));
        }

        if let Some(idx) = times.windows(2).position(|pair| pair[1] < pair[0]) {
            return Err(ScanError::invalid_input(format!(
                "time must be non-decreasing: index {} has {} after {}",
                idx + 1,
                times[idx + 1],
                times[idx]
            )));
        }

        Ok(Self { times, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn times(&self) -> &'a [f64] {
        self.times
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn time_at(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Number of NaN or infinite values.
    pub fn non_finite_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_finite()).count()
    }

    /// Finite values in sample order.
    pub fn finite_values(&self) -> impl Iterator<Item = f64> + 'a {
        self.values.iter().copied().filter(|v| v.is_finite())
    }
}

/// Owned signal; validated on construction like [`SignalView`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signal {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl Signal {
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<Self, ScanError> {
        SignalView::new(&times, &values)?;
        Ok(Self { times, values })
    }

    /// Builds a signal from `(time, value)` pairs.
    pub fn from_samples<I>(samples: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (times, values) = samples.into_iter().unzip();
        Self::new(times, values)
    }

    /// Builds a uniformly sampled signal starting at `t0` with spacing `dt`.
    pub fn from_uniform(values: Vec<f64>, t0: f64, dt: f64) -> Result<Self, ScanError> {
        if !t0.is_finite() {
            return Err(ScanError::invalid_input(format!(
                "uniform time origin must be finite, got {t0}"
            )));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ScanError::invalid_input(format!(
                "uniform time spacing requires finite dt > 0, got {dt}"
            )));
        }

        let times = (0..values.len()).map(|i| t0 + dt * i as f64).collect();
        Self::new(times, values)
    }

    pub fn view(&self) -> SignalView<'_> {
        SignalView {
            times: &self.times,
            values: &self.values,
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelMeta, Signal, SignalView};
    use crate::ScanError;

    #[test]
    fn view_accepts_equal_lengths_and_repeated_times() {
        let times = [0.0, 0.5, 0.5, 1.0];
        let values = [1.0, f64::NAN, 3.0, f64::INFINITY];
        let view = SignalView::new(&times, &values).expect("valid view");
        assert_eq!(view.len(), 4);
        assert_eq!(view.time_at(2), Some(0.5));
        assert_eq!(view.value_at(4), None);
        assert_eq!(view.non_finite_count(), 2);
        assert_eq!(view.finite_values().collect::<Vec<_>>(), vec![1.0, 3.0]);
    }

    #[test]
    fn view_rejects_length_mismatch() {
        let err = SignalView::new(&[0.0, 1.0], &[1.0]).expect_err("mismatch should fail");
        assert!(matches!(err, ScanError::InvalidInput(_)));
        assert!(err.to_string().contains("times=2, values=1"));
    }

    #[test]
    fn view_rejects_nan_and_decreasing_time() {
        let err = SignalView::new(&[0.0, f64::NAN], &[1.0, 2.0]).expect_err("NaN time");
        assert!(err.to_string().contains("index 1 is NaN"));

        let err = SignalView::new(&[0.0, 2.0, 1.0], &[1.0, 2.0, 3.0]).expect_err("decreasing");
        assert!(err.to_string().contains("index 2 has 1 after 2"));
    }

    #[test]
    fn empty_signal_is_valid() {
        let signal = Signal::new(vec![], vec![]).expect("empty signal is valid");
        assert!(signal.is_empty());
        assert!(signal.view().is_empty());
    }

    #[test]
    fn from_samples_and_from_uniform_build_matching_signals() {
        let a = Signal::from_samples([(0.0, 1.0), (0.25, 2.0), (0.5, 3.0)])
            .expect("samples should build");
        let b = Signal::from_uniform(vec![1.0, 2.0, 3.0], 0.0, 0.25).expect("uniform should build");
        assert_eq!(a, b);
        assert_eq!(b.view().times(), &[0.0, 0.25, 0.5]);
    }

    #[test]
    fn from_uniform_rejects_non_positive_spacing() {
        let err = Signal::from_uniform(vec![1.0], 0.0, 0.0).expect_err("dt=0 should fail");
        assert!(err.to_string().contains("dt > 0"));
        assert!(Signal::from_uniform(vec![1.0], f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn channel_meta_builder_sets_unit() {
        let meta = ChannelMeta::new("EngineSpeed").with_unit("rpm");
        assert_eq!(meta.name, "EngineSpeed");
        assert_eq!(meta.unit.as_deref(), Some("rpm"));
    }
}
