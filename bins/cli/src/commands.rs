//! Subcommand handlers.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tracing::{debug, info};

use invoicegen_core::adjust::{AdjustmentPolicy, ValueAdjuster};
use invoicegen_core::batch::{BatchProcessor, BatchSummary, resolve_seed};
use invoicegen_shared::{AppConfig, AppError};

use crate::rows::{RowFormat, read_rows, write_rows};

/// Arguments for `invoicegen adjust`.
#[derive(Args, Debug)]
pub struct AdjustArgs {
    /// Input file. Reads stdin when omitted or `-`.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file. Writes stdout when omitted or `-`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seed for the exempt-rate uplift. Overrides `batch.seed`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Row encoding for input and output.
    #[arg(long, value_enum, default_value_t = RowFormat::Json)]
    pub format: RowFormat,

    /// Print the batch summary as JSON on stderr.
    #[arg(long)]
    pub summary: bool,
}

/// Builds the validated policy from configuration.
fn policy(config: &AppConfig) -> Result<AdjustmentPolicy, AppError> {
    Ok(AdjustmentPolicy::from_config(&config.policy, &config.columns)?)
}

fn is_stdio(path: Option<&Path>) -> bool {
    path.is_none_or(|p| p.as_os_str() == "-")
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>, AppError> {
    match path {
        Some(p) if !is_stdio(Some(p)) => Ok(Box::new(File::open(p)?)),
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, AppError> {
    match path {
        Some(p) if !is_stdio(Some(p)) => Ok(Box::new(File::create(p)?)),
        _ => Ok(Box::new(io::stdout().lock())),
    }
}

/// Sizes the global rayon pool when `batch.threads` is set.
fn configure_threads(config: &AppConfig) -> Result<(), AppError> {
    if let Some(threads) = config.batch.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        debug!(threads, "Configured worker threads");
    }
    Ok(())
}

/// Adjusts rows from `input` and writes them to `output`.
pub fn adjust<R: Read, W: Write>(
    config: &AppConfig,
    input: R,
    output: W,
    format: RowFormat,
    seed: Option<u64>,
) -> Result<BatchSummary, AppError> {
    let processor = BatchProcessor::new(ValueAdjuster::new(policy(config)?));
    let seed = resolve_seed(seed.or(config.batch.seed));

    let rows = read_rows(BufReader::new(input), format)?;
    info!(rows = rows.len(), seed, "Read input rows");

    let report = processor.process(&rows, seed);
    write_rows(BufWriter::new(output), &report.rows, format)?;
    Ok(report.summary)
}

/// Runs `invoicegen adjust`.
pub fn run_adjust(args: &AdjustArgs, config: &AppConfig) -> anyhow::Result<()> {
    configure_threads(config)?;

    let input = open_input(args.input.as_deref())
        .with_context(|| format!("cannot open input {}", display(args.input.as_deref())))?;
    let output = open_output(args.output.as_deref())
        .with_context(|| format!("cannot open output {}", display(args.output.as_deref())))?;

    let summary = adjust(config, input, output, args.format, args.seed)?;
    if args.summary {
        let mut stderr = io::stderr().lock();
        serde_json::to_writer_pretty(&mut stderr, &summary).map_err(AppError::from)?;
        writeln!(stderr).map_err(AppError::from)?;
    }
    Ok(())
}

/// Runs `invoicegen policy`: prints the effective policy as JSON.
pub fn run_policy(config: &AppConfig) -> anyhow::Result<()> {
    let policy = policy(config)?;
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &policy).map_err(AppError::from)?;
    writeln!(stdout).map_err(AppError::from)?;
    Ok(())
}

fn display(path: Option<&Path>) -> String {
    match path {
        Some(p) if !is_stdio(Some(p)) => p.display().to_string(),
        _ => "<stdio>".to_string(),
    }
}
