// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use peakscan_anomaly::{AnomalyConfig, DetectorKind, MergePolicy, score};
use peakscan_core::{ExecutionContext, Signal};
use peakscan_peaks::{
    DetectionConfig, PeakCriteria, ThresholdScale, WidthRange, filter_peaks,
    find_peaks_with_context, peak_statistics,
};

fn build_detection(cursor: &mut common::ByteCursor<'_>) -> DetectionConfig {
    let min_height = match cursor.next_u8() % 3 {
        0 => None,
        1 => Some(f64::from(cursor.next_i16()) / 64.0),
        _ => Some(f64::NAN),
    };
    let width_min = f64::from(cursor.next_u8() % 16) / 2.0;
    let width_range = if cursor.next_u8() & 1 == 0 {
        WidthRange {
            min: width_min,
            max: None,
        }
    } else {
        WidthRange::new(width_min, width_min + f64::from(cursor.next_u8()))
    };
    DetectionConfig {
        min_height,
        min_distance: common::bounded(cursor.next_u8(), 0, 64),
        min_prominence: f64::from(cursor.next_i16()) / 256.0,
        width_range,
        threshold_scale: if cursor.next_u8() & 1 == 0 {
            ThresholdScale::Absolute
        } else {
            ThresholdScale::SignalStd
        },
    }
}

fn build_anomaly(cursor: &mut common::ByteCursor<'_>) -> AnomalyConfig {
    let mask = cursor.next_u8();
    let enabled = DetectorKind::ALL
        .into_iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, kind)| kind);
    AnomalyConfig {
        statistical_threshold: f64::from(cursor.next_u8()) / 32.0,
        zscore_threshold: f64::from(cursor.next_u8()) / 32.0,
        iqr_multiplier: f64::from(cursor.next_u8()) / 64.0,
        temporal_window: common::bounded(cursor.next_u8(), 1, 32),
        isolation_contamination: f64::from(cursor.next_u8()) / 255.0,
        isolation_trees: common::bounded(cursor.next_u8(), 0, 16),
        isolation_sample_size: common::bounded(cursor.next_u8(), 1, 64),
        seed: cursor.next_u64(),
        merge_policy: if cursor.next_u8() & 1 == 0 {
            MergePolicy::Union
        } else {
            MergePolicy::Majority
        },
        ..AnomalyConfig::with_detectors(enabled)
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let detection = build_detection(&mut cursor);
    let anomaly = build_anomaly(&mut cursor);

    let payload_len = common::bounded(cursor.next_u8(), 0, 255).saturating_mul(8);
    let values = common::decode_f64_chunks(&cursor.take_padded(payload_len), 255);
    let dt = common::bounded(cursor.next_u8(), 1, 100) as f64 / 100.0;
    let Ok(signal) = Signal::from_uniform(values, 0.0, dt) else {
        return;
    };

    let ctx = ExecutionContext::new();
    let Ok(detection) = find_peaks_with_context(&signal.view(), &detection, &ctx) else {
        return;
    };
    let _ = peak_statistics(&detection.peaks);
    let criteria = PeakCriteria {
        min_prominence: Some(f64::from(cursor.next_u8()) / 16.0),
        ..PeakCriteria::default()
    };
    let _ = filter_peaks(&detection.peaks, &criteria);
    let _ = score(&signal.view(), &detection.peaks, &anomaly);
});
