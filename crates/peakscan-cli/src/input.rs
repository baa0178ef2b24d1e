// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use peakscan_core::ChannelMeta;
use peakscan_pipeline::ChannelInput;
use std::collections::BTreeSet;
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Malformed(String),
}

impl InputError {
    fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Splits a `name [unit]` column header into channel metadata.
pub fn parse_channel_header(raw: &str) -> ChannelMeta {
    let trimmed = raw.trim();
    if let Some(stripped) = trimmed.strip_suffix(']') {
        if let Some(open) = stripped.rfind('[') {
            let name = stripped[..open].trim();
            let unit = stripped[open + 1..].trim();
            if !name.is_empty() {
                let meta = ChannelMeta::new(name);
                return if unit.is_empty() {
                    meta
                } else {
                    meta.with_unit(unit)
                };
            }
        }
    }
    ChannelMeta::new(trimmed)
}

/// Reads a `time, channel...` table into per-channel inputs.
///
/// Empty value cells become NaN samples; `selected` restricts and orders the
/// returned channels, all channels are returned when it is empty.
pub fn read_channels_csv<R: Read>(
    reader: R,
    selected: &[String],
) -> Result<Vec<ChannelInput>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(InputError::malformed(
            "expected a time column followed by at least one channel column",
        ));
    }

    let metas: Vec<ChannelMeta> = headers.iter().skip(1).map(parse_channel_header).collect();
    let mut seen = BTreeSet::new();
    for meta in &metas {
        if !seen.insert(meta.name.as_str()) {
            return Err(InputError::malformed(format!(
                "duplicate channel '{}'",
                meta.name
            )));
        }
    }

    let columns = select_columns(&metas, selected)?;
    let mut times = vec![];
    let mut values: Vec<Vec<f64>> = vec![vec![]; columns.len()];

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let line = row + 2;
        let raw_time = record.get(0).unwrap_or("");
        let time = raw_time.parse::<f64>().map_err(|_| {
            InputError::malformed(format!("row {line}: invalid time '{raw_time}'"))
        })?;
        times.push(time);

        for (slot, &column) in columns.iter().enumerate() {
            let cell = record.get(column + 1).unwrap_or("");
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>().map_err(|_| {
                    InputError::malformed(format!(
                        "row {line}, channel '{}': invalid value '{cell}'",
                        metas[column].name
                    ))
                })?
            };
            values[slot].push(value);
        }
    }

    tracing::debug!(
        rows = times.len(),
        channels = columns.len(),
        "loaded channel table"
    );

    Ok(columns
        .into_iter()
        .zip(values)
        .map(|(column, values)| ChannelInput::new(metas[column].clone(), times.clone(), values))
        .collect())
}

fn select_columns(metas: &[ChannelMeta], selected: &[String]) -> Result<Vec<usize>, InputError> {
    if selected.is_empty() {
        return Ok((0..metas.len()).collect());
    }
    selected
        .iter()
        .map(|name| {
            metas
                .iter()
                .position(|meta| meta.name == *name)
                .ok_or_else(|| {
                    let available = metas
                        .iter()
                        .map(|meta| meta.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    InputError::malformed(format!(
                        "unknown channel '{name}'; available: {available}"
                    ))
                })
        })
        .collect()
}
