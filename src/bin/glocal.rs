use std::fs;
use std::fs::File;
use std::io::{self, stdout, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, span, Level};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use glocal::aligner::config::DEFAULT_MAX_CELLS;
use glocal::aligner::scoring::{DEFAULT_GAP, DEFAULT_MATCH, DEFAULT_MISMATCH};
use glocal::io::{
    lattice_to_dot, load_codes_or_default, load_locality, load_matrix, load_sequences, write_alignment, write_settings,
    OutputFormat,
};
use glocal::lattice::Lattice;
use glocal::{AlignerConfig, GlocalAligner, Scoring, Sequence};

/// The output formats supported by glocal
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputType {
    /// Report with input sequences, aligned rows and the alignment score
    Text,

    /// Aligned rows in FASTA format
    Fasta,

    /// Alignment and score as JSON
    Json,
}

impl From<OutputType> for OutputFormat {
    fn from(value: OutputType) -> Self {
        match value {
            OutputType::Text => OutputFormat::Text,
            OutputType::Fasta => OutputFormat::Fasta,
            OutputType::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct CliArgs {
    /// Set verbosity level. Use multiple times to increase the verbosity level.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<GlocalSubcommand>,
}

#[derive(Subcommand, Debug)]
enum GlocalSubcommand {
    /// Compute an optimal multiple alignment of the given sequences
    Align(AlignArgs),

    /// Output the state lattice implied by the boundary conditions of the sequences in DOT format
    Lattice(LatticeArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Sequences to align in FASTA format.
    #[clap(help_heading = "Inputs")]
    sequences: PathBuf,

    /// Boundary conditions per sequence. Sequences not listed are global at both ends.
    #[arg(short, long)]
    #[clap(help_heading = "Inputs")]
    locality: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AlignArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output filename. If not given, defaults to stdout
    #[arg(short, long)]
    #[clap(help_heading = "Outputs")]
    output: Option<PathBuf>,

    /// Output file type.
    #[arg(value_enum, short = 'O', long, default_value = "text")]
    #[clap(help_heading = "Outputs")]
    output_type: OutputType,

    /// Also write the state lattice in DOT format to the given file
    #[arg(long)]
    #[clap(help_heading = "Outputs")]
    lattice_dot: Option<PathBuf>,

    /// Substitution matrix file. Replaces the match and mismatch scores for the symbols it lists.
    #[arg(short, long)]
    #[clap(help_heading = "Alignment configuration")]
    scores: Option<PathBuf>,

    /// Ambiguity code file, mapping codes to the symbols they stand for. Defaults to the IUPAC nucleotide codes.
    #[arg(short, long)]
    #[clap(help_heading = "Alignment configuration")]
    codes: Option<PathBuf>,

    /// Score for two equal symbols
    #[arg(long, default_value_t = DEFAULT_MATCH as f32, allow_negative_numbers = true)]
    #[clap(help_heading = "Alignment configuration")]
    match_score: f32,

    /// Score for two different symbols
    #[arg(long, default_value_t = DEFAULT_MISMATCH as f32, allow_negative_numbers = true)]
    #[clap(help_heading = "Alignment configuration")]
    mismatch_score: f32,

    /// Score for a symbol aligned to a gap
    #[arg(long, default_value_t = DEFAULT_GAP as f32, allow_negative_numbers = true)]
    #[clap(help_heading = "Alignment configuration")]
    gap_score: f32,

    /// Number of threads used to fill score tables
    #[arg(short = 't', long, default_value_t = 1)]
    #[clap(help_heading = "Resources")]
    threads: usize,

    /// Upper bound on the number of score table cells
    #[arg(long, default_value_t = DEFAULT_MAX_CELLS)]
    #[clap(help_heading = "Resources")]
    max_cells: usize,
}

#[derive(Args, Debug)]
struct LatticeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output filename. If not given, defaults to stdout
    #[arg(short, long)]
    #[clap(help_heading = "Outputs")]
    output: Option<PathBuf>,
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log filter")?;

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(filter_layer);

    Registry::default().with(stderr_log).init();

    Ok(())
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if let Some(path) = path {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?
        }

        let file = File::create(path)
            .with_context(|| format!("Could not create output file {path:?}"))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(stdout()))
    };

    Ok(writer)
}

fn read_inputs(input: &InputArgs) -> Result<Vec<Sequence>> {
    let mut sequences = load_sequences(&input.sequences)
        .with_context(|| format!("Could not read sequences from {:?}", input.sequences))?;
    info!("Read {} sequences from {:?}.", sequences.len(), input.sequences);

    if let Some(path) = &input.locality {
        load_locality(&mut sequences, path)
            .with_context(|| format!("Could not read boundary conditions from {path:?}"))?;
    }

    for seq in &sequences {
        info!("{seq}");
    }

    Ok(sequences)
}

fn align_subcommand(align_args: &AlignArgs) -> Result<()> {
    let span = span!(Level::INFO, "align_subcommand");
    let _enter = span.enter();

    let start = Instant::now();
    let sequences = read_inputs(&align_args.input)?;

    let mut scoring = Scoring::new(align_args.match_score, align_args.mismatch_score, align_args.gap_score);
    if let Some(path) = &align_args.scores {
        let matrix = load_matrix(path, align_args.gap_score)
            .with_context(|| format!("Could not read substitution matrix from {path:?}"))?;
        scoring = scoring.with_matrix(matrix);
    }

    let codes = load_codes_or_default(align_args.codes.as_deref())
        .with_context(|| format!("Could not read ambiguity codes from {:?}", align_args.codes))?;
    scoring = scoring.with_codes(codes);

    let config = AlignerConfig::default()
        .with_threads(align_args.threads)
        .with_max_cells(align_args.max_cells);

    let aligner = GlocalAligner::with_config(scoring, config);
    let alignment = aligner.align(&sequences)
        .context("Alignment failed")?;

    if let Some(path) = &align_args.lattice_dot {
        let mut writer = open_output(Some(path.as_path()))?;
        lattice_to_dot(alignment.lattice(), &mut writer)?;
        writer.flush()?;
    }

    let mut writer = open_output(align_args.output.as_deref())?;
    if align_args.output_type == OutputType::Text {
        write_settings(aligner.scoring(), start.elapsed(), &mut writer)?;
    }
    write_alignment(&alignment, align_args.output_type.into(), &mut writer)?;
    writer.flush()?;

    Ok(())
}

fn lattice_subcommand(lattice_args: &LatticeArgs) -> Result<()> {
    let sequences = read_inputs(&lattice_args.input)?;
    let lattice = Lattice::from_sequences(&sequences);
    info!("Lattice has {} states.", lattice.len());

    let mut writer = open_output(lattice_args.output.as_deref())?;
    lattice_to_dot(&lattice, &mut writer)?;
    writer.flush()?;

    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose)?;

    match &args.command {
        Some(GlocalSubcommand::Align(v)) => align_subcommand(v)?,
        Some(GlocalSubcommand::Lattice(v)) => lattice_subcommand(v)?,
        None => anyhow::bail!("No subcommand given."),
    };

    Ok(())
}
