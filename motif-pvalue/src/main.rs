use clap::Parser;
use log::{info, warn};
use motif_pssm::{
    Background, MatrixKind, Motif, MotifError, MotifInfo, MotifSet, ScaledMotif, ScalingConfig,
};
use polars::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process;
use std::str::FromStr;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Invalid configuration file: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid background '{0}', expected A=<p>,C=<p>,G=<p>,T=<p>")]
    InvalidBackground(String),

    #[error("{count} motif {what} given for {files} matrix files")]
    LabelCount {
        what: &'static str,
        count: usize,
        files: usize,
    },

    #[error("Cannot derive a motif ID from '{0}', pass --id")]
    MissingId(String),

    #[error("Window '{0}' is not as long as any loaded motif")]
    UnmatchedWindow(String),

    #[error("Unable to start the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{0}")]
    Motif(#[from] MotifError),
}

#[derive(Parser)]
#[command(
    name = "motif-pvalue",
    about = "Scales DNA motif probability matrices and reports exact p-values of motif scores",
    long_about = "A tool for turning DNA motif probability matrices into integer scoring matrices \
                  and the exact distribution of their scores under a background model. \
                  Motifs are prepared in parallel. For each motif it prints the requested \
                  matrices and, for each candidate window of matching width, \
                  its integer score, log-odds score and p-value.",
    version,
    after_help = "Example usage:\n    \
                  motif-pvalue ctcf.csv --id MA0139.1 --name CTCF --print score_matrix\n    \
                  motif-pvalue ctcf.csv ap2.csv -j 4 --background A=0.3,C=0.2,G=0.2,T=0.3 \
                  --sequence TGGCCACCAGGGGGCGCTA",
    color = clap::ColorChoice::Always
)]
#[derive(Debug)]
struct Args {
    /// Paths to the probability matrices (CSV format)
    /// Each must contain numeric columns A, C, G and T, one row per motif position
    #[arg(value_name = "MATRIX_FILE", required = true, num_args = 1..)]
    matrix_files: Vec<String>,

    /// Motif ID, once per matrix file in the same order
    /// Defaults to the file name without extension
    #[arg(long = "id", value_name = "ID")]
    ids: Vec<String>,

    /// Extended motif name, once per matrix file in the same order
    /// Defaults to the motif ID
    #[arg(long = "name", value_name = "NAME")]
    names: Vec<String>,

    /// Background distribution as A=<p>,C=<p>,G=<p>,T=<p>
    /// Uniform when omitted
    #[arg(long)]
    background: Option<String>,

    /// Scaling factor applied to log-odds scores
    /// Derived from the scaling range and tolerance when omitted
    #[arg(long)]
    scale: Option<u32>,

    /// Maximum error accepted when converting integer scores back to log-odds
    #[arg(long)]
    tolerance: Option<f64>,

    /// Scaling configuration (JSON format)
    #[arg(long, value_name = "CONFIG_FILE")]
    config: Option<String>,

    /// Matrix to print: raw_counts, score_matrix or pval_matrix
    /// May be given several times
    #[arg(long = "print", value_name = "MATRIX", value_parser = MatrixKind::from_str)]
    print: Vec<MatrixKind>,

    /// Candidate window to score against every motif of the same width
    /// May be given several times
    #[arg(long = "sequence", value_name = "WINDOW")]
    sequences: Vec<String>,

    /// Number of CPU cores used to prepare the motifs, 0 uses all of them
    #[arg(short = 'j', long, default_value_t = 0)]
    cores: usize,

    /// Print debug messages and the full error chain on failure
    #[arg(long)]
    debug: bool,
}

fn parse_background(text: &str) -> Result<Background, CliError> {
    let invalid = || CliError::InvalidBackground(text.to_string());

    let mut mapping = HashMap::new();
    for entry in text.split(',') {
        let (symbol, value) = entry.split_once('=').ok_or_else(invalid)?;
        let mut chars = symbol.trim().chars();
        let nucleotide = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(invalid()),
        };
        let p: f64 = value.trim().parse().map_err(|_| invalid())?;
        mapping.insert(nucleotide, p);
    }

    Ok(Background::from_map(&mapping)?)
}

fn load_config(path: &str) -> Result<ScalingConfig, CliError> {
    let text = fs::read_to_string(path)?;
    let config: ScalingConfig = serde_json::from_str(&text)?;
    Ok(config)
}

/// Pairs every matrix file with its motif ID and name.
fn motif_labels(args: &Args) -> Result<Vec<(String, String)>, CliError> {
    let files = args.matrix_files.len();
    for (what, count) in [("IDs", args.ids.len()), ("names", args.names.len())] {
        if count != 0 && count != files {
            return Err(CliError::LabelCount { what, count, files });
        }
    }

    args.matrix_files
        .iter()
        .enumerate()
        .map(|(i, path)| -> Result<(String, String), CliError> {
            let id = match args.ids.get(i) {
                Some(id) => id.clone(),
                None => Path::new(path)
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| CliError::MissingId(path.clone()))?,
            };
            let name = args.names.get(i).cloned().unwrap_or_else(|| id.clone());
            Ok((id, name))
        })
        .collect()
}

fn load_motif(path: &str, id: String, name: String) -> Result<Motif, CliError> {
    let pwm = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()?
        .collect()?;
    let motif = Motif::from_pwm(&pwm, id, name)?;
    info!("Loaded motif {} of width {} from {}", motif.id(), motif.width(), path);
    Ok(motif)
}

fn report_motif(motif: &ScaledMotif, args: &Args) -> Result<(), CliError> {
    println!(
        "motif: {} ({})\tscale: {}\toffset: {}\tscore range: [{}, {}]",
        motif.id(),
        motif.name(),
        motif.scale(),
        motif.offset(),
        motif.min_value(),
        motif.max_value()
    );

    for kind in &args.print {
        motif.print(*kind)?;
    }

    for window in args
        .sequences
        .iter()
        .filter(|window| window.chars().count() == motif.width())
    {
        let score = motif.score_sequence(window)?;
        println!(
            "{}\t{}\t{}\t{:.4}\t{:.6e}",
            motif.id(),
            window,
            score,
            motif.score_to_log_odds(score),
            motif.pvalue(score)?
        );
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), CliError> {
    let start_time = std::time::Instant::now();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ScalingConfig::default(),
    };
    if let Some(tolerance) = args.tolerance {
        config = config.with_tolerance(tolerance);
    }
    let background = match &args.background {
        Some(text) => parse_background(text)?,
        None => Background::uniform(),
    };

    let labels = motif_labels(args)?;
    let mut motifs = MotifSet::new();
    for (path, (id, name)) in args.matrix_files.iter().zip(labels) {
        motifs.add_motifs([load_motif(path, id, name)?]);
    }
    if motifs.has_duplicate_ids() {
        warn!("Several motifs share the same ID");
    }

    for window in &args.sequences {
        let length = window.chars().count();
        if !motifs.iter().any(|motif| motif.width() == length) {
            return Err(CliError::UnmatchedWindow(window.clone()));
        }
    }

    ThreadPoolBuilder::new()
        .num_threads(args.cores)
        .build_global()?;
    let prepared = motifs.prepare(&background, args.scale, &config)?;

    for motif in &prepared {
        report_motif(motif, args)?;
    }

    let elapsed = start_time.elapsed();
    info!(
        "Prepared {} motifs in {:.4} seconds",
        prepared.len(),
        elapsed.as_secs_f64()
    );

    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = ctrlc::set_handler(|| {
        eprintln!("\nCaught SIGINT. motif-pvalue will exit");
        process::exit(2);
    }) {
        warn!("Unable to install the SIGINT handler: {}", e);
    }

    if let Err(e) = run(&args) {
        if args.debug {
            eprintln!("ERROR: {:?}", e);
        } else {
            eprintln!("ERROR: {}", e);
        }
        process::exit(1);
    }
}
