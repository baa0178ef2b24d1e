// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use peakscan_anomaly::{
    AnomalyConfig, AnomalyReport, DetectorKind, DetectorRun, MergePolicy, score,
};
use peakscan_core::Signal;
use peakscan_peaks::{DetectionConfig, find_peaks};

/// Triangular peaks every 10 samples: `a/2, a, a/2` centred at `10k + 5`.
fn spiky_signal(amplitudes: &[f64]) -> Signal {
    let mut values = vec![0.0; amplitudes.len() * 10];
    for (k, &a) in amplitudes.iter().enumerate() {
        let i = k * 10 + 5;
        values[i - 1] = a / 2.0;
        values[i] = a;
        values[i + 1] = a / 2.0;
    }
    Signal::from_uniform(values, 0.0, 1.0).expect("signal should build")
}

fn analyse(signal: &Signal, config: &AnomalyConfig) -> AnomalyReport {
    let peaks =
        find_peaks(&signal.view(), &DetectionConfig::default()).expect("peaks should be found");
    score(&signal.view(), &peaks, config).expect("scoring should succeed")
}

const OUTLIER_AMPLITUDES: [f64; 10] = [1.00, 1.01, 1.02, 1.03, 50.0, 1.04, 1.05, 1.06, 1.07, 1.08];

#[test]
fn single_extreme_peak_has_highest_confidence() {
    let signal = spiky_signal(&OUTLIER_AMPLITUDES);
    assert_eq!(signal.len(), 100);
    let report = analyse(&signal, &AnomalyConfig::default());

    assert_eq!(report.peaks.len(), 10);
    let outlier = &report.peaks[4];
    assert_eq!(outlier.peak.index, 45);
    assert!(outlier.verdict.is_anomaly);
    assert!(outlier.verdict.flagged_by.contains(&DetectorKind::Statistical));
    assert!(outlier.verdict.flagged_by.contains(&DetectorKind::Iqr));
    assert!(outlier.verdict.flagged_by.contains(&DetectorKind::Isolation));
    assert_eq!(outlier.verdict.evaluated_by.len(), 5);
    assert!((outlier.verdict.confidence - 0.6).abs() < 1e-12);

    for (position, scored) in report.peaks.iter().enumerate() {
        if position == 4 {
            continue;
        }
        assert!(
            scored.verdict.confidence < outlier.verdict.confidence,
            "peak {position} should be less suspicious than the outlier"
        );
        assert!(!scored.verdict.is_anomaly);
    }

    // Ten samples bound the z-score below 3, so the classic test cannot fire.
    assert_eq!(
        report.detector_run(DetectorKind::Zscore),
        Some(&DetectorRun::Ran { flagged: 0 })
    );
    assert_eq!(
        report.detector_run(DetectorKind::Temporal),
        Some(&DetectorRun::Ran { flagged: 0 })
    );
    assert_eq!(report.summary.total_anomalies, 1);
    assert_eq!(report.summary.max_confidence, outlier.verdict.confidence);
    assert!(report.warnings.is_empty());
}

#[test]
fn majority_policy_still_flags_a_three_of_five_outlier() {
    let signal = spiky_signal(&OUTLIER_AMPLITUDES);
    let config = AnomalyConfig {
        merge_policy: MergePolicy::Majority,
        ..AnomalyConfig::default()
    };
    let report = analyse(&signal, &config);
    let flagged: Vec<usize> = report.anomalies().map(|p| p.peak.index).collect();
    assert_eq!(flagged, vec![45]);
}

#[test]
fn identical_peak_values_raise_no_value_based_flags() {
    let signal = spiky_signal(&[2.0; 12]);
    let report = analyse(&signal, &AnomalyConfig::default());

    assert_eq!(report.peaks.len(), 12);
    assert!(matches!(
        report.detector_run(DetectorKind::Statistical),
        Some(DetectorRun::NotRun { .. })
    ));
    assert!(matches!(
        report.detector_run(DetectorKind::Zscore),
        Some(DetectorRun::NotRun { .. })
    ));
    assert_eq!(
        report.detector_run(DetectorKind::Iqr),
        Some(&DetectorRun::Ran { flagged: 0 })
    );
    assert!(report.peaks.iter().all(|p| !p.verdict.is_anomaly));
    assert!(report.peaks.iter().all(|p| p.verdict.confidence == 0.0));
    assert_eq!(report.summary.total_anomalies, 0);
}

#[test]
fn scoring_twice_yields_identical_verdicts() {
    let signal = spiky_signal(&OUTLIER_AMPLITUDES);
    let config = AnomalyConfig {
        seed: 1234,
        ..AnomalyConfig::default()
    };
    let first = analyse(&signal, &config);
    let second = analyse(&signal, &config);
    assert_eq!(first.peaks, second.peaks);
    assert_eq!(first.detectors, second.detectors);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.diagnostics.seed, Some(1234));
}

#[test]
fn disabled_detectors_never_evaluate() {
    let signal = spiky_signal(&OUTLIER_AMPLITUDES);
    let config = AnomalyConfig::with_detectors([DetectorKind::Statistical]);
    let report = analyse(&signal, &config);
    assert_eq!(report.detectors.len(), 1);
    for scored in &report.peaks {
        assert_eq!(
            scored.verdict.evaluated_by.iter().copied().collect::<Vec<_>>(),
            vec![DetectorKind::Statistical]
        );
        assert_eq!(scored.verdict.scores.len(), 1);
    }
    assert_eq!(report.peaks[4].verdict.confidence, 1.0);
}

#[cfg(feature = "serde")]
#[test]
fn report_serializes_with_detector_names() {
    let signal = spiky_signal(&OUTLIER_AMPLITUDES);
    let report = analyse(&signal, &AnomalyConfig::default());
    let encoded = serde_json::to_value(&report).expect("report should serialize");
    assert_eq!(encoded["detectors"][0]["detector"], "statistical");
    assert_eq!(encoded["detectors"][0]["run"]["status"], "ran");
    assert!(encoded["peaks"][4]["verdict"]["scores"]["iqr"].is_number());
}
