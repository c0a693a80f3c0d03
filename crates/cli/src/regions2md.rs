//! regions2md - Order detected page regions and render them
//!
//! A command line tool that reads documents of detected regions (JSON),
//! reconstructs their reading order and writes Markdown, plain text or the
//! ordered JSON document.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use lectio_core::api::{
    document_from_json, document_to_json, extract_markdown_to_fp, extract_text_to_fp,
    order_document,
};
use lectio_core::converter::MarkdownOptions;
use lectio_core::order::{FlowSignal, OrderParams, RankingSignal, ReplaySignal};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Output type for the ordered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum OutputType {
    /// Markdown output (default)
    #[default]
    Markdown,
    /// Plain text, one paragraph per region
    Text,
    /// The input document with reading orders filled in
    Json,
}

/// Ranking signal used before falling back to spatial order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum SignalKind {
    /// Spatial order only
    #[default]
    None,
    /// Geometric flow ranking (see --flow)
    Flow,
    /// Precomputed score matrices (see --scores)
    Scores,
}

/// Order detected page regions and render them as Markdown, text or JSON.
#[derive(Parser, Debug)]
#[command(name = "regions2md")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One or more paths to region documents (JSON)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    // === Ordering options ===
    /// Ranking signal to use
    #[arg(long, value_enum, default_value = "none")]
    signal: SignalKind,

    /// JSON file of precomputed score matrices, for --signal scores
    #[arg(long)]
    scores: Option<PathBuf>,

    /// Flow direction for --signal flow (-1.0 to 1.0)
    #[arg(long, default_value = "0.5", value_parser = parse_flow)]
    flow: f64,

    /// JSON file with ordering parameters; flags below override it
    #[arg(long)]
    params: Option<PathBuf>,

    /// Pages with more regions than this skip the ranking signal
    #[arg(long = "max-regions")]
    max_regions: Option<usize>,

    /// Horizontal gap (page pixels) between x-centers that starts a column
    #[arg(long = "column-gap")]
    column_gap: Option<f64>,

    /// Disable column detection in the spatial fallback
    #[arg(long = "no-columns", action = ArgAction::SetTrue)]
    no_columns: bool,

    /// Flag tables that continue across page breaks
    #[arg(long = "cross-page", action = ArgAction::SetTrue)]
    cross_page: bool,

    /// Worker threads for ordering pages
    #[arg(long)]
    threads: Option<usize>,

    // === Output options ===
    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Type of output to generate
    #[arg(short = 't', long = "output-type", value_enum, default_value = "markdown")]
    output_type: OutputType,
}

/// Parse a flow value in -1.0..=1.0.
fn parse_flow(s: &str) -> std::result::Result<f64, String> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid float value: {}", s))?;
    if (-1.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("flow must be between -1.0 and 1.0, got {}", v))
    }
}

/// Infer output type from file extension.
fn infer_output_type(path: &str) -> Option<OutputType> {
    let path_lower = path.to_lowercase();
    if path_lower.ends_with(".json") {
        Some(OutputType::Json)
    } else if path_lower.ends_with(".txt") {
        Some(OutputType::Text)
    } else {
        None
    }
}

/// Build OrderParams from the params file and command line overrides.
fn build_params(args: &Args) -> Result<OrderParams> {
    let mut params = match &args.params {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read params file {}", path.display()))?;
            serde_json::from_slice(&data)
                .with_context(|| format!("invalid params file {}", path.display()))?
        }
        None => OrderParams::default(),
    };

    if let Some(max) = args.max_regions {
        params.max_regions = max;
    }
    if let Some(gap) = args.column_gap {
        params.column_gap = gap;
    }
    if args.no_columns {
        params.column_detection = false;
    }
    if args.cross_page {
        params.cross_page = true;
    }
    if args.threads.is_some() {
        params.threads = args.threads;
    }

    params.validate()?;
    Ok(params)
}

/// Build the ranking signal selected on the command line.
fn build_signal(args: &Args) -> Result<Option<Arc<dyn RankingSignal>>> {
    Ok(match args.signal {
        SignalKind::None => None,
        SignalKind::Flow => Some(Arc::new(FlowSignal::new(args.flow))),
        SignalKind::Scores => {
            let Some(path) = &args.scores else {
                bail!("--signal scores requires --scores <FILE>");
            };
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read scores file {}", path.display()))?;
            let replay = ReplaySignal::from_json(&data)
                .with_context(|| format!("invalid scores file {}", path.display()))?;
            info!(records = replay.len(), "loaded precomputed scores");
            Some(Arc::new(replay))
        }
    })
}

/// Process a single region document.
fn process_file<W: Write>(
    path: &Path,
    writer: &mut W,
    signal: Option<Arc<dyn RankingSignal>>,
    params: &OrderParams,
    output_type: OutputType,
) -> Result<()> {
    let data = std::fs::read(path)?;
    let mut document = document_from_json(&data)?;
    if document.source.is_none() {
        document.source = Some(path.display().to_string());
    }

    let report = order_document(&mut document, signal, params.clone())?;
    for err in report.failed_pages() {
        eprintln!("Warning: {}: {}", path.display(), err);
    }
    debug!(
        file = %path.display(),
        pages = document.pages.len(),
        fallback = report.fallback_pages(),
        "ordered"
    );

    match output_type {
        OutputType::Markdown => {
            extract_markdown_to_fp(&document, writer, MarkdownOptions::default())?
        }
        OutputType::Text => extract_text_to_fp(&document, writer, false)?,
        OutputType::Json => {
            writer.write_all(document_to_json(&document)?.as_bytes())?;
            writer.write_all(b"\n")?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let params = build_params(&args)?;
    let signal = build_signal(&args)?;

    // Determine output type (may be inferred from output filename)
    let output_type = if args.output_type == OutputType::Markdown && args.outfile != "-" {
        infer_output_type(&args.outfile).unwrap_or(args.output_type)
    } else {
        args.output_type
    };

    // Open output file or use stdout
    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("failed to create output file {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    for path in &args.files {
        if !path.exists() {
            bail!("file not found: {}", path.display());
        }
        process_file(path, &mut output, signal.clone(), &params, output_type)
            .with_context(|| format!("error processing {}", path.display()))?;
    }

    output.flush()?;
    Ok(())
}
