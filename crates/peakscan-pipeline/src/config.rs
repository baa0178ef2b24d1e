// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use peakscan_anomaly::AnomalyConfig;
use peakscan_core::ScanError;
use peakscan_peaks::DetectionConfig;
use serde::{Deserialize, Serialize};

/// Peak detection and anomaly scoring settings applied to every channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub detection: DetectionConfig,
    pub anomaly: AnomalyConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        self.detection.validate()?;
        self.anomaly.validate()
    }

    /// Parses and validates a JSON document; absent fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ScanError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| ScanError::configuration(format!("invalid pipeline config JSON: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ScanError> {
        serde_json::to_string_pretty(self).map_err(|err| {
            ScanError::configuration(format!("failed to serialize pipeline config: {err}"))
        })
    }
}
