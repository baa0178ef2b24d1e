// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use peakscan_anomaly::{DetectorKind, MergePolicy};
use peakscan_peaks::ThresholdScale;
use peakscan_pipeline::PipelineConfig;
use std::collections::BTreeSet;

/// Command-line values that replace fields of a loaded [`PipelineConfig`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigOverrides {
    pub min_height: Option<f64>,
    pub min_distance: Option<usize>,
    pub min_prominence: Option<f64>,
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
    pub threshold_scale: Option<ThresholdScale>,
    pub methods: Vec<DetectorKind>,
    pub seed: Option<u64>,
    pub merge_policy: Option<MergePolicy>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        let detection = &mut config.detection;
        if let Some(min_height) = self.min_height {
            detection.min_height = Some(min_height);
        }
        if let Some(min_distance) = self.min_distance {
            detection.min_distance = min_distance;
        }
        if let Some(min_prominence) = self.min_prominence {
            detection.min_prominence = min_prominence;
        }
        if let Some(min_width) = self.min_width {
            detection.width_range.min = min_width;
        }
        if let Some(max_width) = self.max_width {
            detection.width_range.max = Some(max_width);
        }
        if let Some(scale) = self.threshold_scale {
            detection.threshold_scale = scale;
        }

        let anomaly = &mut config.anomaly;
        if !self.methods.is_empty() {
            anomaly.enabled = self.methods.iter().copied().collect::<BTreeSet<_>>();
        }
        if let Some(seed) = self.seed {
            anomaly.seed = seed;
        }
        if let Some(policy) = self.merge_policy {
            anomaly.merge_policy = policy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConfigOverrides;
    use peakscan_anomaly::{DetectorKind, MergePolicy};
    use peakscan_peaks::{ThresholdScale, WidthRange};
    use peakscan_pipeline::PipelineConfig;

    #[test]
    fn empty_overrides_leave_config_untouched() {
        let mut config = PipelineConfig::from_json_str(r#"{ "detection": { "min_distance": 7 } }"#)
            .expect("config should parse");
        let before = config.clone();
        ConfigOverrides::default().apply(&mut config);
        assert_eq!(config, before);
    }

    #[test]
    fn flags_replace_file_values() {
        let mut config = PipelineConfig::from_json_str(
            r#"{ "detection": { "min_distance": 7, "width_range": { "min": 1.0, "max": 4.0 } },
                 "anomaly": { "seed": 3 } }"#,
        )
        .expect("config should parse");
        ConfigOverrides {
            min_height: Some(1.5),
            min_distance: Some(20),
            max_width: Some(40.0),
            threshold_scale: Some(ThresholdScale::SignalStd),
            methods: vec![DetectorKind::Iqr, DetectorKind::Zscore, DetectorKind::Iqr],
            seed: Some(11),
            merge_policy: Some(MergePolicy::Majority),
            ..ConfigOverrides::default()
        }
        .apply(&mut config);

        assert_eq!(config.detection.min_height, Some(1.5));
        assert_eq!(config.detection.min_distance, 20);
        assert_eq!(config.detection.width_range, WidthRange::new(1.0, 40.0));
        assert_eq!(config.detection.threshold_scale, ThresholdScale::SignalStd);
        assert_eq!(
            config.anomaly.enabled.iter().copied().collect::<Vec<_>>(),
            vec![DetectorKind::Zscore, DetectorKind::Iqr]
        );
        assert_eq!(config.anomaly.seed, 11);
        assert_eq!(config.anomaly.merge_policy, MergePolicy::Majority);
    }
}
