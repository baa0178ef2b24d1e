// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod config;
pub mod filter;
pub mod finder;
pub mod statistics;

pub use config::{DetectionConfig, ResolvedThresholds, ThresholdScale, WidthRange};
pub use filter::{PeakCriteria, filter_peaks};
pub use finder::{PeakDetection, PeakFinder, PeakRecord, find_peaks, find_peaks_with_context};
pub use statistics::{MetricSummary, PeakStatistics, peak_statistics};

/// Peak finding namespace.
pub fn crate_name() -> &'static str {
    let _ = peakscan_core::crate_name();
    "peakscan-peaks"
}
