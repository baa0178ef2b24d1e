// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod analysis;
pub mod batch;
pub mod config;
pub mod export;

pub use analysis::{ChannelAnalysis, ChannelFailure, FailureStage, analyze_signal};
pub use batch::{BatchReport, ChannelInput, analyze_batch};
pub use config::PipelineConfig;
pub use export::{
    ChannelDocument, ExportDocument, ExportError, ExportMetadata, ExportRow, export_header,
    export_rows, write_csv,
};

/// Pipeline namespace.
pub fn crate_name() -> &'static str {
    let _ = peakscan_anomaly::crate_name();
    "peakscan-pipeline"
}
