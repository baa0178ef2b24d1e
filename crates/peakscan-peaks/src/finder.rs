// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::{DetectionConfig, ResolvedThresholds};
use peakscan_core::{Diagnostics, ExecutionContext, FilterStats, ScanError, SignalView};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::time::Instant;

const CANCEL_CHECK_EVERY: usize = 4096;
const MIN_SAMPLES: usize = 3;

/// A detected local maximum with its shape metrics.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PeakRecord {
    pub index: usize,
    pub time: f64,
    pub value: f64,
    pub prominence: f64,
    /// Width in samples at half prominence.
    pub width: f64,
    pub left_base: usize,
    pub right_base: usize,
    /// Fractional sample position of the left half-prominence crossing.
    pub left_crossing: f64,
    pub right_crossing: f64,
}

/// Accepted peaks plus run metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct PeakDetection {
    pub peaks: Vec<PeakRecord>,
    pub diagnostics: Diagnostics,
}

/// Local-maximum peak finder.
#[derive(Clone, Debug)]
pub struct PeakFinder {
    config: DetectionConfig,
}

impl PeakFinder {
    pub fn new(config: DetectionConfig) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn detect(
        &self,
        signal: &SignalView<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<PeakDetection, ScanError> {
        let started_at = Instant::now();
        let values = signal.values();
        let n = values.len();

        let mut diagnostics = Diagnostics {
            n,
            algorithm: Cow::Borrowed("peak_finder"),
            repro_mode: ctx.repro_mode,
            non_finite_samples: signal.non_finite_count(),
            ..Diagnostics::default()
        };
        #[cfg(feature = "serde")]
        {
            diagnostics.params_json = serde_json::to_value(&self.config).ok();
        }
        if diagnostics.non_finite_samples > 0 {
            diagnostics.warnings.push(format!(
                "{} non-finite samples are never reported as peaks",
                diagnostics.non_finite_samples
            ));
        }

        if n < MIN_SAMPLES {
            diagnostics
                .notes
                .push(format!("signal has {n} samples; at least {MIN_SAMPLES} are needed"));
            diagnostics.filter_stats = Some(FilterStats::default());
            diagnostics.runtime_ms = Some(elapsed_ms(started_at));
            return Ok(PeakDetection {
                peaks: vec![],
                diagnostics,
            });
        }

        let thresholds = self.config.resolve(signal);
        diagnostics.notes.push(format!(
            "threshold_scale={:?}, effective_height={:?}, effective_prominence={}",
            self.config.threshold_scale, thresholds.height, thresholds.prominence
        ));

        let mut stats = FilterStats::default();
        let candidates = local_maxima(values, ctx)?;
        stats.candidates = candidates.len();
        ctx.check_cancelled()?;

        let candidates = filter_by_height(values, candidates, &thresholds, &mut stats);
        let candidates =
            enforce_min_distance(values, candidates, self.config.min_distance, &mut stats);

        let mut peaks = Vec::with_capacity(candidates.len());
        for (iteration, &index) in candidates.iter().enumerate() {
            ctx.check_cancelled_every(iteration, CANCEL_CHECK_EVERY)?;

            let shape = measure_shape(values, index);
            if shape.prominence < thresholds.prominence {
                stats.rejected_prominence += 1;
                continue;
            }
            if !self.config.width_range.contains(shape.width) {
                stats.rejected_width += 1;
                continue;
            }

            peaks.push(PeakRecord {
                index,
                time: signal.time_at(index).unwrap_or(f64::NAN),
                value: values[index],
                prominence: shape.prominence,
                width: shape.width,
                left_base: shape.left_base,
                right_base: shape.right_base,
                left_crossing: shape.left_crossing,
                right_crossing: shape.right_crossing,
            });
        }

        ctx.record_scalar("peaks.candidates", stats.candidates as f64);
        ctx.record_scalar("peaks.accepted", peaks.len() as f64);
        tracing::debug!(
            samples = n,
            candidates = stats.candidates,
            rejected_height = stats.rejected_height,
            rejected_distance = stats.rejected_distance,
            rejected_prominence = stats.rejected_prominence,
            rejected_width = stats.rejected_width,
            accepted = peaks.len(),
            "peak finding complete"
        );

        diagnostics.filter_stats = Some(stats);
        diagnostics.runtime_ms = Some(elapsed_ms(started_at));
        Ok(PeakDetection { peaks, diagnostics })
    }
}

/// Finds peaks with a default execution context.
pub fn find_peaks(
    signal: &SignalView<'_>,
    config: &DetectionConfig,
) -> Result<Vec<PeakRecord>, ScanError> {
    find_peaks_with_context(signal, config, &ExecutionContext::new()).map(|found| found.peaks)
}

/// Finds peaks while honouring cancellation and recording telemetry.
pub fn find_peaks_with_context(
    signal: &SignalView<'_>,
    config: &DetectionConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<PeakDetection, ScanError> {
    PeakFinder::new(config.clone())?.detect(signal, ctx)
}

fn elapsed_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Ordering key: non-finite samples sit below every finite value.
fn key(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        f64::NEG_INFINITY
    }
}

/// Indices `i` in `1..n-1` with `v[i] > v[i-1]` and `v[i] >= v[i+1]`.
fn local_maxima(values: &[f64], ctx: &ExecutionContext<'_>) -> Result<Vec<usize>, ScanError> {
    let mut out = vec![];
    for i in 1..values.len() - 1 {
        ctx.check_cancelled_every(i, CANCEL_CHECK_EVERY)?;
        let current = values[i];
        if !current.is_finite() {
            continue;
        }
        if current > key(values[i - 1]) && current >= key(values[i + 1]) {
            out.push(i);
        }
    }
    Ok(out)
}

fn filter_by_height(
    values: &[f64],
    candidates: Vec<usize>,
    thresholds: &ResolvedThresholds,
    stats: &mut FilterStats,
) -> Vec<usize> {
    let Some(min_height) = thresholds.height else {
        return candidates;
    };
    let before = candidates.len();
    let kept: Vec<usize> = candidates
        .into_iter()
        .filter(|&i| values[i] >= min_height)
        .collect();
    stats.rejected_height = before - kept.len();
    kept
}

/// Greedy selection by value (descending, ties to the lower index); a
/// candidate is dropped when an already accepted peak is closer than
/// `min_distance` samples.
fn enforce_min_distance(
    values: &[f64],
    candidates: Vec<usize>,
    min_distance: usize,
    stats: &mut FilterStats,
) -> Vec<usize> {
    if min_distance <= 1 || candidates.len() < 2 {
        return candidates;
    }

    let mut order = candidates.clone();
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let reach = min_distance - 1;
    let mut accepted = BTreeSet::new();
    for index in order {
        let lo = index.saturating_sub(reach);
        let hi = index.saturating_add(reach);
        if accepted.range(lo..=hi).next().is_none() {
            accepted.insert(index);
        }
    }

    stats.rejected_distance = candidates.len() - accepted.len();
    accepted.into_iter().collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PeakShape {
    prominence: f64,
    left_base: usize,
    right_base: usize,
    width: f64,
    left_crossing: f64,
    right_crossing: f64,
}

/// Prominence, bases and half-prominence width for the peak at `peak`.
fn measure_shape(values: &[f64], peak: usize) -> PeakShape {
    let n = values.len();
    let height = values[peak];

    // Left: walk until a sample at least as high as the peak.
    let mut left_floor = height;
    let mut left_base = peak;
    let mut left_limit = 0;
    let mut j = peak;
    while j > 0 {
        j -= 1;
        let x = values[j];
        if !x.is_finite() {
            continue;
        }
        if x >= height {
            left_limit = j + 1;
            break;
        }
        if x < left_floor {
            left_floor = x;
            left_base = j;
        }
    }

    // Right: skip the peak's own plateau first.
    let mut k = peak + 1;
    while k < n && values[k] == height {
        k += 1;
    }
    let mut right_floor = height;
    let mut right_base = peak;
    let mut right_limit = n;
    while k < n {
        let x = values[k];
        if x.is_finite() {
            if x >= height {
                right_limit = k;
                break;
            }
            if x < right_floor {
                right_floor = x;
                right_base = k;
            }
        }
        k += 1;
    }

    let prominence = (height - left_floor.max(right_floor)).max(0.0);
    let level = height - prominence / 2.0;

    let mut left = peak;
    while left > left_limit && key(values[left - 1]) >= level {
        left -= 1;
    }
    let left_crossing = match left.checked_sub(1).map(|i| values[i]) {
        Some(below) if below.is_finite() && below < level => {
            left as f64 - (values[left] - level) / (values[left] - below)
        }
        _ => left as f64,
    };

    let mut right = peak;
    while right + 1 < right_limit && key(values[right + 1]) >= level {
        right += 1;
    }
    let right_crossing = match values.get(right + 1) {
        Some(&below) if below.is_finite() && below < level => {
            right as f64 + (values[right] - level) / (values[right] - below)
        }
        _ => right as f64,
    };

    PeakShape {
        prominence,
        left_base,
        right_base,
        width: right_crossing - left_crossing,
        left_crossing,
        right_crossing,
    }
}
