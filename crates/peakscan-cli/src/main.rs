// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use clap::{Args, Parser, Subcommand, ValueEnum};
use peakscan_anomaly::{DetectorKind, MergePolicy};
use peakscan_cli::{ConfigOverrides, InputError, read_channels_csv};
use peakscan_core::{ExecutionContext, ProgressSink, ReproMode, ScanError, TracingTelemetry};
use peakscan_peaks::ThresholdScale;
use peakscan_pipeline::{
    ExportDocument, ExportError, PipelineConfig, analyze_batch, export_rows, write_csv,
};
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "peakscan")]
#[command(version, about = "Peak detection and multi-method anomaly scoring", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect peaks and score anomalies for channels of a CSV table
    Detect(DetectArgs),

    /// Print the default pipeline configuration as JSON
    Config {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// CSV with a time column followed by one column per channel
    #[arg(short, long)]
    input: PathBuf,

    /// Channel to analyse; repeat to select several (all channels when omitted)
    #[arg(short, long = "channel")]
    channels: Vec<String>,

    /// Pipeline configuration JSON; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_height: Option<f64>,

    #[arg(long)]
    min_distance: Option<usize>,

    #[arg(long)]
    min_prominence: Option<f64>,

    /// Minimum half-prominence width in samples
    #[arg(long)]
    min_width: Option<f64>,

    /// Maximum half-prominence width in samples
    #[arg(long)]
    max_width: Option<f64>,

    #[arg(long, value_enum)]
    threshold_scale: Option<ScaleArg>,

    /// Comma-separated detectors (statistical, zscore, iqr, temporal, isolation)
    #[arg(short, long, value_delimiter = ',')]
    methods: Vec<DetectorKind>,

    /// Seed for the isolation detector
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    merge_policy: Option<PolicyArg>,

    #[arg(short, long, value_enum, default_value = "json")]
    format: FormatArg,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Process channels sequentially for bit-reproducible runs
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScaleArg {
    Absolute,
    SignalStd,
}

impl From<ScaleArg> for ThresholdScale {
    fn from(value: ScaleArg) -> Self {
        match value {
            ScaleArg::Absolute => Self::Absolute,
            ScaleArg::SignalStd => Self::SignalStd,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    Union,
    Majority,
}

impl From<PolicyArg> for MergePolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Union => Self::Union,
            PolicyArg::Majority => Self::Majority,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
}

#[derive(Debug)]
enum CliError {
    Scan(ScanError),
    Input(InputError),
    Export(ExportError),
    Io {
        context: String,
        source: io::Error,
    },
    Json {
        context: String,
        source: serde_json::Error,
    },
}

impl CliError {
    fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Scan(err) => err.code(),
            Self::Input(InputError::Csv(_)) => "csv_error",
            Self::Input(InputError::Malformed(_)) => "invalid_input",
            Self::Export(_) => "export_error",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan(err) => write!(f, "{err}"),
            Self::Input(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::Json { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scan(err) => Some(err),
            Self::Input(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ScanError> for CliError {
    fn from(value: ScanError) -> Self {
        Self::Scan(value)
    }
}

impl From<InputError> for CliError {
    fn from(value: InputError) -> Self {
        Self::Input(value)
    }
}

impl From<ExportError> for CliError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

/// Logs batch progress in whole percent.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_progress(&self, fraction: f32) {
        tracing::debug!(percent = (fraction * 100.0).round() as u32, "batch progress");
    }
}

fn main() {
    if let Err(err) = run() {
        emit_structured_error(&err);
        process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Detect(args) => handle_detect(args, cli.verbose),
        Commands::Config { output } => handle_config(output.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn handle_detect(args: DetectArgs, verbose: bool) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    overrides_from(&args).apply(&mut config);

    let file = File::open(&args.input).map_err(|source| {
        CliError::io(format!("failed to open '{}'", args.input.display()), source)
    })?;
    let inputs = read_channels_csv(BufReader::new(file), &args.channels)?;
    tracing::info!(
        input = %args.input.display(),
        channels = inputs.len(),
        "analysing channels"
    );

    let progress = LogProgress;
    let telemetry = TracingTelemetry;
    let repro_mode = if args.strict {
        ReproMode::Strict
    } else {
        ReproMode::Balanced
    };
    let mut ctx = ExecutionContext::new().with_repro_mode(repro_mode);
    if verbose {
        ctx = ctx
            .with_progress_sink(&progress)
            .with_telemetry_sink(&telemetry);
    }

    let report = analyze_batch(&inputs, &config, &ctx)?;
    for failure in &report.failures {
        tracing::warn!("{failure}");
    }
    tracing::info!(
        peaks = report.total_peaks(),
        anomalies = report.total_anomalies(),
        failed_channels = report.failures.len(),
        "analysis complete"
    );

    match args.format {
        FormatArg::Json => {
            write_json_output(&ExportDocument::from_batch(&report, &config), args.output.as_deref())
        }
        FormatArg::Csv => {
            let detectors: Vec<DetectorKind> = config.anomaly.enabled.iter().copied().collect();
            let rows = export_rows(&report.analyses, &detectors);
            match args.output.as_deref() {
                Some(path) => {
                    let file = File::create(path).map_err(|source| {
                        CliError::io(format!("failed to create '{}'", path.display()), source)
                    })?;
                    write_csv(BufWriter::new(file), &rows, &detectors)?;
                }
                None => write_csv(io::stdout().lock(), &rows, &detectors)?,
            }
            Ok(())
        }
    }
}

fn handle_config(output: Option<&Path>) -> Result<(), CliError> {
    write_json_output(&PipelineConfig::default(), output)
}

fn overrides_from(args: &DetectArgs) -> ConfigOverrides {
    ConfigOverrides {
        min_height: args.min_height,
        min_distance: args.min_distance,
        min_prominence: args.min_prominence,
        min_width: args.min_width,
        max_width: args.max_width,
        threshold_scale: args.threshold_scale.map(Into::into),
        methods: args.methods.clone(),
        seed: args.seed,
        merge_policy: args.merge_policy.map(Into::into),
    }
}

fn load_config(path: &Path) -> Result<PipelineConfig, CliError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    Ok(PipelineConfig::from_json_str(&raw)?)
}

fn write_json_output<T: Serialize>(
    payload: &T,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(payload)
        .map_err(|source| CliError::json("failed to serialize JSON output", source))?;

    if let Some(path) = output_path {
        fs::write(path, format!("{encoded}\n"))
            .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))
    } else {
        println!("{encoded}");
        Ok(())
    }
}

fn emit_structured_error(err: &CliError) {
    let envelope = ErrorEnvelope {
        error: ErrorPayload {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    };

    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!(
            "{{\"error\":{{\"code\":\"{}\",\"message\":\"{}\"}}}}",
            err.code(),
            err
        ),
    }
}
