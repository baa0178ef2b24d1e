// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod control;
pub mod diagnostics;
pub mod error;
pub mod execution_context;
pub mod observability;
pub mod repro;
pub mod signal;
pub mod stats;

pub use control::CancelToken;
pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, Diagnostics, FilterStats};
pub use error::ScanError;
pub use execution_context::ExecutionContext;
pub use observability::{ProgressSink, TelemetrySink, TracingTelemetry};
pub use repro::ReproMode;
pub use signal::{ChannelMeta, Signal, SignalView};

/// Core shared types for peakscan.
pub fn crate_name() -> &'static str {
    "peakscan-core"
}
