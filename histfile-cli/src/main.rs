//! histfile command-line interface.
//!
//! Inspects, converts and merges JHF and ORNL DRR/HIS histogram files.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};
use histfile_core::{Gate, GateLimits, Histogram, Repository, Scaler, Shape};
use histfile_io::{load_file, save_file, CodecConfig, LoadMode, LoadReport};
use log::debug;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        source: histfile_io::Error,
    },

    #[error("Codec error: {0}")]
    Codec(#[from] histfile_io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Histogram file inspection and conversion.
#[derive(Parser)]
#[command(name = "histfile")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON codec configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the histograms, gates and scalers in a file
    Info {
        /// Input file (.jhf, .drr or .his)
        input: PathBuf,

        /// Print a JSON summary instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Convert between JHF and ORNL DRR/HIS
    Convert {
        /// Input file
        input: PathBuf,

        /// Output file; the extension selects the format
        output: PathBuf,
    },

    /// Sum several files into one
    Merge {
        /// Output file
        output: PathBuf,

        /// Input files; the first defines the histograms
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[derive(Serialize)]
struct HistogramSummary<'a> {
    name: &'a str,
    title: &'a str,
    number: i32,
    shape: Shape,
    kind: histfile_core::CountKind,
    sum: f64,
}

#[derive(Serialize)]
struct FileSummary<'a> {
    histograms: Vec<HistogramSummary<'a>>,
    gates: &'a [Gate],
    scalers: &'a [Scaler],
}

impl<'a> FileSummary<'a> {
    fn new(repo: &'a Repository) -> Self {
        Self {
            histograms: repo.histograms().iter().map(summarize).collect(),
            gates: repo.gates(),
            scalers: repo.scalers(),
        }
    }
}

fn summarize(h: &Histogram) -> HistogramSummary<'_> {
    HistogramSummary {
        name: h.name(),
        title: h.title(),
        number: h.number(),
        shape: h.shape(),
        kind: h.kind(),
        sum: h.counts().sum(),
    }
}

fn load(repo: &mut Repository, path: &Path, mode: LoadMode) -> Result<LoadReport> {
    load_file(repo, path, mode).map_err(|source| CliError::File {
        path: path.to_path_buf(),
        source,
    })
}

fn save(repo: &Repository, path: &Path, config: &CodecConfig) -> Result<()> {
    save_file(repo, path, config).map_err(|source| CliError::File {
        path: path.to_path_buf(),
        source,
    })
}

fn describe_limits(gate: &Gate) -> String {
    match gate.limits() {
        None => "undefined".to_owned(),
        Some(GateLimits::Interval { low, high }) => format!("[{}, {}]", low, high),
        Some(GateLimits::Polygon(points)) => format!("{} point polygon", points.len()),
    }
}

fn print_table(path: &Path, repo: &Repository) {
    println!("File: {}", path.display());
    println!("Histograms: {}", repo.histograms().len());
    if !repo.histograms().is_empty() {
        println!(
            "  {:<16} {:>6} {:<12} {:<7} {:>14}  Title",
            "Name", "Number", "Size", "Type", "Sum"
        );
        for h in repo.histograms() {
            println!(
                "  {:<16} {:>6} {:<12} {:<7} {:>14.0}  {}",
                h.name(),
                h.number(),
                h.shape().to_string(),
                format!("{:?}", h.kind()),
                h.counts().sum(),
                h.title()
            );
        }
    }

    println!("Gates: {}", repo.gates().len());
    for g in repo.gates() {
        println!("  {:<16} on {:<16} {}", g.name(), g.histogram(), describe_limits(g));
    }

    println!("Scalers: {}", repo.scalers().len());
    for s in repo.scalers() {
        println!("  {:<16} {:>6} {:>12}", s.name, s.number, s.value);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match &cli.config {
        Some(path) => CodecConfig::from_file(path)?,
        None => CodecConfig::default(),
    };

    match cli.command {
        Commands::Info { input, json } => {
            let mut repo = Repository::new();
            load(&mut repo, &input, LoadMode::Open)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&FileSummary::new(&repo))?);
            } else {
                print_table(&input, &repo);
            }
        }

        Commands::Convert { input, output } => {
            let mut repo = Repository::new();
            let report = load(&mut repo, &input, LoadMode::Open)?;
            save(&repo, &output, &config)?;
            println!(
                "Wrote {} histogram(s), {} gate(s), {} scaler(s) to {}",
                report.histograms,
                report.gates,
                report.scalers,
                output.display()
            );
        }

        Commands::Merge { output, inputs } => {
            let mut repo = Repository::new();
            let mut warnings = 0;
            for (i, input) in inputs.iter().enumerate() {
                let mode = if i == 0 { LoadMode::Open } else { LoadMode::Add };
                debug!("merge input {} ({:?})", input.display(), mode);
                warnings += load(&mut repo, input, mode)?.warnings.len();
            }
            save(&repo, &output, &config)?;
            println!(
                "Merged {} file(s) into {} ({} warning(s))",
                inputs.len(),
                output.display(),
                warnings
            );
        }
    }

    Ok(())
}
