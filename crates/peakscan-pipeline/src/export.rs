// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::analysis::{ChannelAnalysis, ChannelFailure};
use crate::batch::BatchReport;
use crate::config::PipelineConfig;
use peakscan_anomaly::{AnomalySummary, DetectorKind, DetectorStatus, ScoredPeak};
use peakscan_core::{ChannelMeta, DIAGNOSTICS_SCHEMA_VERSION};
use peakscan_peaks::PeakStatistics;
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;

const BASE_COLUMNS: [&str; 9] = [
    "channel",
    "index",
    "time",
    "value",
    "prominence",
    "width",
    "is_anomaly",
    "confidence",
    "flagged_by",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("json export failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One peak projected into a flat table row.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportRow {
    pub channel: String,
    pub index: usize,
    pub time: f64,
    pub value: f64,
    pub prominence: f64,
    pub width: f64,
    pub is_anomaly: bool,
    pub confidence: f64,
    pub flagged_by: Vec<DetectorKind>,
    /// Aligned with the detector columns; `None` when the detector did not
    /// evaluate the peak.
    pub scores: Vec<Option<f64>>,
}

impl ExportRow {
    fn from_scored(channel: &str, scored: &ScoredPeak, detectors: &[DetectorKind]) -> Self {
        let peak = &scored.peak;
        let verdict = &scored.verdict;
        Self {
            channel: channel.to_string(),
            index: peak.index,
            time: peak.time,
            value: peak.value,
            prominence: peak.prominence,
            width: peak.width,
            is_anomaly: verdict.is_anomaly,
            confidence: verdict.confidence,
            flagged_by: verdict.flagged_by.iter().copied().collect(),
            scores: detectors
                .iter()
                .map(|kind| verdict.scores.get(kind).copied())
                .collect(),
        }
    }

    fn record(&self) -> Vec<String> {
        let mut fields = vec![
            self.channel.clone(),
            self.index.to_string(),
            self.time.to_string(),
            self.value.to_string(),
            self.prominence.to_string(),
            self.width.to_string(),
            self.is_anomaly.to_string(),
            self.confidence.to_string(),
            self.flagged_by
                .iter()
                .map(|kind| kind.name())
                .collect::<Vec<_>>()
                .join(";"),
        ];
        fields.extend(
            self.scores
                .iter()
                .map(|score| score.map(|s| s.to_string()).unwrap_or_default()),
        );
        fields
    }
}

/// Column names for a table with one score column per detector.
pub fn export_header(detectors: &[DetectorKind]) -> Vec<String> {
    BASE_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .chain(detectors.iter().map(|kind| format!("score_{}", kind.name())))
        .collect()
}

/// Flattens every analysed channel into rows, channel by channel.
pub fn export_rows(analyses: &[ChannelAnalysis], detectors: &[DetectorKind]) -> Vec<ExportRow> {
    analyses
        .iter()
        .flat_map(|analysis| {
            analysis
                .report
                .peaks
                .iter()
                .map(|scored| ExportRow::from_scored(&analysis.channel.name, scored, detectors))
        })
        .collect()
}

pub fn write_csv<W: Write>(
    writer: W,
    rows: &[ExportRow],
    detectors: &[DetectorKind],
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(export_header(detectors))?;
    for row in rows {
        csv_writer.write_record(row.record())?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Run-level metadata for a JSON export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub engine: String,
    pub engine_version: String,
    pub schema_version: u32,
    pub channel_count: usize,
    pub analysed_channels: usize,
    pub failed_channels: usize,
    pub total_peaks: usize,
    pub total_anomalies: usize,
    pub detectors: Vec<DetectorKind>,
    pub thread_count: Option<usize>,
    pub runtime_ms: Option<u64>,
    pub config: PipelineConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelDocument {
    pub channel: ChannelMeta,
    pub peaks: Vec<ScoredPeak>,
    pub peak_statistics: PeakStatistics,
    pub anomaly_summary: AnomalySummary,
    pub detectors: Vec<DetectorStatus>,
    pub warnings: Vec<String>,
}

impl From<&ChannelAnalysis> for ChannelDocument {
    fn from(analysis: &ChannelAnalysis) -> Self {
        let mut warnings = analysis.peak_diagnostics.warnings.clone();
        warnings.extend(analysis.report.warnings.iter().cloned());
        Self {
            channel: analysis.channel.clone(),
            peaks: analysis.report.peaks.clone(),
            peak_statistics: analysis.peak_statistics,
            anomaly_summary: analysis.report.summary.clone(),
            detectors: analysis.report.detectors.clone(),
            warnings,
        }
    }
}

/// Structured export of a whole batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub metadata: ExportMetadata,
    pub channels: Vec<ChannelDocument>,
    pub failures: Vec<ChannelFailure>,
}

impl ExportDocument {
    pub fn from_batch(report: &BatchReport, config: &PipelineConfig) -> Self {
        let metadata = ExportMetadata {
            engine: "peakscan".to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            channel_count: report.channel_count(),
            analysed_channels: report.analyses.len(),
            failed_channels: report.failures.len(),
            total_peaks: report.total_peaks(),
            total_anomalies: report.total_anomalies(),
            detectors: config.anomaly.enabled.iter().copied().collect(),
            thread_count: report.diagnostics.thread_count,
            runtime_ms: report.diagnostics.runtime_ms,
            config: config.clone(),
        };
        Self {
            metadata,
            channels: report.analyses.iter().map(ChannelDocument::from).collect(),
            failures: report.failures.clone(),
        }
    }

    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}
