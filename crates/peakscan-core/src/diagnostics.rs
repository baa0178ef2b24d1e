// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::repro::ReproMode;
use std::borrow::Cow;

/// Diagnostics schema version for peak and anomaly run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Counters describing how many candidates each peak filter removed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub candidates: usize,
    pub rejected_height: usize,
    pub rejected_distance: usize,
    pub rejected_prominence: usize,
    pub rejected_width: usize,
}

impl FilterStats {
    pub fn accepted(&self) -> usize {
        self.candidates.saturating_sub(
            self.rejected_height
                + self.rejected_distance
                + self.rejected_prominence
                + self.rejected_width,
        )
    }
}

/// Structured diagnostics captured from a peak finding or scoring run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    /// Number of samples in the analysed signal.
    pub n: usize,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub runtime_ms: Option<u64>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub algorithm: Cow<'static, str>,
    pub seed: Option<u64>,
    pub repro_mode: ReproMode,
    pub thread_count: Option<usize>,
    #[cfg(feature = "serde")]
    pub params_json: Option<serde_json::Value>,
    pub filter_stats: Option<FilterStats>,
    pub non_finite_samples: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            n: 0,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: None,
            notes: vec![],
            warnings: vec![],
            algorithm: Cow::Borrowed(""),
            seed: None,
            repro_mode: ReproMode::Balanced,
            thread_count: None,
            #[cfg(feature = "serde")]
            params_json: None,
            filter_stats: None,
            non_finite_samples: 0,
        }
    }
}
