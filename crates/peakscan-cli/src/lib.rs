// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod input;
pub mod overrides;

pub use input::{InputError, parse_channel_header, read_channels_csv};
pub use overrides::ConfigOverrides;

/// CLI namespace.
pub fn crate_name() -> &'static str {
    let _ = peakscan_pipeline::crate_name();
    "peakscan-cli"
}
