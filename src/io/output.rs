use std::io::Write;
use std::time::Duration;

use serde::Serialize;

use crate::aligner::scoring::{ScoreType, Scoring};
use crate::aligner::Alignment;
use crate::errors::GlocalError;
use crate::io::fasta::write_alignment_fasta;
use crate::sequence::Sequence;

const RULE: &str = "----------------------------------------------------------";
const DOUBLE_RULE: &str = "==========================================================";
const HASH_RULE: &str = "##########################################################";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable report with the input sequences, the aligned rows and the score
    Text,

    /// Aligned rows in FASTA format
    Fasta,

    /// Alignment, score and visited lattice states as JSON
    Json,
}

#[derive(Serialize)]
struct AlignedRecord<'a> {
    name: &'a str,
    global_left: bool,
    global_right: bool,
    aligned: String,
}

#[derive(Serialize)]
struct AlignmentRecord<'a, S> {
    score: S,
    columns: usize,
    sequences: Vec<AlignedRecord<'a>>,
    path: Vec<String>,
}

pub fn write_alignment<S, W>(alignment: &Alignment<S>, format: OutputFormat, writer: &mut W) -> Result<(), GlocalError>
where
    S: ScoreType,
    W: Write
{
    match format {
        OutputFormat::Text => write_text_report(alignment, writer),
        OutputFormat::Fasta => write_alignment_fasta(alignment, writer),
        OutputFormat::Json => write_json(alignment, writer),
    }
}

pub fn write_text_report<S, W>(alignment: &Alignment<S>, writer: &mut W) -> Result<(), GlocalError>
where
    S: ScoreType,
    W: Write
{
    writeln!(writer, "{DOUBLE_RULE}")?;
    writeln!(writer, "Sequences:")?;
    writeln!(writer, "{RULE}")?;
    for (i, seq) in alignment.sequences().iter().enumerate() {
        let input = Sequence::new(seq.name(), seq.ungapped(), seq.is_global_left(), seq.is_global_right());
        writeln!(writer, "({i}) {input}")?;
    }
    writeln!(writer, "{RULE}")?;

    let path: Vec<_> = alignment.path().iter()
        .map(|ix| alignment.lattice().get(*ix).label())
        .collect();
    writeln!(writer, "States: {} ({})", alignment.lattice().len(), path.join(" -> "))?;
    writeln!(writer, "{DOUBLE_RULE}")?;
    writeln!(writer)?;

    writeln!(writer, "{DOUBLE_RULE}")?;
    writeln!(writer, "ALIGNMENT:")?;
    writeln!(writer, "{RULE}")?;
    for seq in alignment.sequences() {
        let open = if seq.is_global_left() { '[' } else { '(' };
        let close = if seq.is_global_right() { ']' } else { ')' };

        writeln!(writer, "{open} {} {close}", String::from_utf8_lossy(seq.symbols()))?;
    }
    writeln!(writer, "{RULE}")?;
    writeln!(writer, "Score: {}", alignment.score())?;
    writeln!(writer, "{DOUBLE_RULE}")?;

    Ok(())
}

/// Run time and scoring settings, written ahead of the text report
pub fn write_settings<S, W>(scoring: &Scoring<S>, elapsed: Duration, writer: &mut W) -> Result<(), GlocalError>
where
    S: ScoreType,
    W: Write
{
    writeln!(writer, "took {} ms", elapsed.as_millis())?;
    writeln!(writer)?;

    writeln!(writer, "{HASH_RULE}")?;
    writeln!(writer, "Settings:")?;
    writeln!(writer)?;
    writeln!(writer, "Match score: {}", scoring.match_score())?;
    writeln!(writer, "Mismatch score: {}", scoring.mismatch_score())?;
    writeln!(writer, "Gap score: {}", scoring.gap_score())?;

    match scoring.matrix() {
        Some(matrix) => {
            let alphabet: Vec<_> = matrix.alphabet().iter()
                .map(|s| char::from(*s).to_string())
                .collect();
            writeln!(writer, "Substitution matrix: {}", alphabet.join(" "))?;
        },
        None => writeln!(writer, "Substitution matrix: none")?,
    }
    writeln!(writer)?;

    writeln!(writer, "{DOUBLE_RULE}")?;
    writeln!(writer, "Codes:")?;
    writeln!(writer, "{RULE}")?;

    let mut codes: Vec<_> = scoring.codes().iter().collect();
    codes.sort_unstable_by_key(|(code, _)| *code);
    for (code, symbols) in codes {
        let symbols: Vec<_> = symbols.iter()
            .map(|s| char::from(*s).to_string())
            .collect();
        writeln!(writer, "{}:\t{}", char::from(code), symbols.join(" "))?;
    }

    writeln!(writer, "{RULE}")?;
    writeln!(writer, "{DOUBLE_RULE}")?;
    writeln!(writer, "{HASH_RULE}")?;
    writeln!(writer)?;

    Ok(())
}

pub fn write_json<S, W>(alignment: &Alignment<S>, writer: &mut W) -> Result<(), GlocalError>
where
    S: ScoreType,
    W: Write
{
    let record = AlignmentRecord {
        score: alignment.score(),
        columns: alignment.num_columns(),
        sequences: alignment.sequences().iter()
            .map(|seq| AlignedRecord {
                name: seq.name(),
                global_left: seq.is_global_left(),
                global_right: seq.is_global_right(),
                aligned: String::from_utf8_lossy(seq.symbols()).into_owned(),
            })
            .collect(),
        path: alignment.path().iter()
            .map(|ix| alignment.lattice().get(*ix).label())
            .collect(),
    };

    serde_json::to_writer_pretty(&mut *writer, &record)?;
    writeln!(writer)?;

    Ok(())
}
