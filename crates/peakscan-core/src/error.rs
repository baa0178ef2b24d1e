// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use thiserror::Error;

/// Errors raised by peak finding, anomaly scoring and the drivers around them.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ScanError {
    /// Invalid threshold or range values. Raised before any processing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed signal or peaks that do not belong to the signal.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Too little data for a stage. Callers degrade instead of failing.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A single anomaly detector failed.
    #[error("detector '{detector}' failed: {message}")]
    Detector {
        detector: &'static str,
        message: String,
    },

    /// Non-finite intermediate values where finite ones were required.
    #[error("numerical issue: {0}")]
    NumericalIssue(String),

    #[error("cancelled")]
    Cancelled,
}

impl ScanError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn detector(detector: &'static str, msg: impl Into<String>) -> Self {
        Self::Detector {
            detector,
            message: msg.into(),
        }
    }

    pub fn numerical_issue(msg: impl Into<String>) -> Self {
        Self::NumericalIssue(msg.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    /// Stable machine-readable code used by error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::InsufficientData(_) => "insufficient_data",
            Self::Detector { .. } => "detector_error",
            Self::NumericalIssue(_) => "numerical_issue",
            Self::Cancelled => "cancelled",
        }
    }
}
