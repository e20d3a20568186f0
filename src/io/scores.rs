//! Substitution matrix and ambiguity code files.
//!
//! A matrix file starts with a header line listing the alphabet, followed by one row per
//! symbol: the symbol itself and its scores against every symbol of the header. An
//! ambiguity code file has one code per line, separated by a tab from the symbols it
//! stands for. In both, `#` starts a comment.

use std::io::BufRead;
use std::path::Path;

use crate::aligner::scoring::{AmbiguityCodes, ScoreType, SubstitutionMatrix};
use crate::errors::GlocalError;
use crate::io::{content_lines, open_input};

fn single_symbol(token: &str, line_no: usize) -> Result<u8, GlocalError> {
    match token.as_bytes() {
        [symbol] => Ok(*symbol),
        _ => Err(GlocalError::parse(line_no, format!("expected a single symbol, got '{token}'"))),
    }
}

pub fn read_matrix<S, R>(reader: R, gap_score: S) -> Result<SubstitutionMatrix<S>, GlocalError>
where
    S: ScoreType,
    R: BufRead
{
    let lines = content_lines(reader, '#')?;
    let Some(((header_no, header), rows)) = lines.split_first() else {
        return Err(GlocalError::parse(0, "empty substitution matrix"));
    };

    let alphabet = header.split_whitespace()
        .map(|token| single_symbol(token, *header_no))
        .collect::<Result<Vec<_>, _>>()?;

    if rows.len() != alphabet.len() {
        return Err(GlocalError::parse(*header_no, format!(
            "expected {} matrix rows, found {}", alphabet.len(), rows.len())));
    }

    let mut scores = Vec::with_capacity(alphabet.len());
    for ((line_no, line), expected) in rows.iter().zip(&alphabet) {
        let mut tokens = line.split_whitespace();
        let symbol = single_symbol(tokens.next().unwrap_or_default(), *line_no)?;
        if symbol != *expected {
            return Err(GlocalError::parse(*line_no, format!(
                "row for '{}' where '{}' was expected", char::from(symbol), char::from(*expected))));
        }

        let row = tokens
            .map(|v| v.parse::<f64>()
                .map(S::from_score)
                .map_err(|_| GlocalError::parse(*line_no, format!("invalid score '{v}'"))))
            .collect::<Result<Vec<_>, _>>()?;

        if row.len() != alphabet.len() {
            return Err(GlocalError::parse(*line_no, format!(
                "expected {} scores, found {}", alphabet.len(), row.len())));
        }

        scores.push(row);
    }

    SubstitutionMatrix::new(alphabet, scores, gap_score)
}

pub fn load_matrix<S>(path: impl AsRef<Path>, gap_score: S) -> Result<SubstitutionMatrix<S>, GlocalError>
where
    S: ScoreType
{
    read_matrix(open_input(path)?, gap_score)
}

pub fn read_codes<R: BufRead>(reader: R) -> Result<AmbiguityCodes, GlocalError> {
    let mut codes = AmbiguityCodes::default();

    for (line_no, line) in content_lines(reader, '#')? {
        let Some((code, symbols)) = line.split_once('\t') else {
            return Err(GlocalError::parse(line_no, "expected '<code>\\t<symbols>'"));
        };

        let code = single_symbol(code.trim(), line_no)?;
        let symbols = symbols.split_whitespace()
            .map(|token| single_symbol(token, line_no))
            .collect::<Result<Vec<_>, _>>()?;

        if symbols.is_empty() {
            return Err(GlocalError::parse(line_no, format!("no symbols for code '{}'", char::from(code))));
        }

        codes.insert(code, &symbols);
    }

    Ok(codes)
}

pub fn load_codes(path: impl AsRef<Path>) -> Result<AmbiguityCodes, GlocalError> {
    read_codes(open_input(path)?)
}

/// Ambiguity codes from the given file, or the IUPAC nucleotide codes if there is none
pub fn load_codes_or_default(path: Option<&Path>) -> Result<AmbiguityCodes, GlocalError> {
    match path {
        Some(path) => load_codes(path),
        None => Ok(AmbiguityCodes::iupac_nucleotides()),
    }
}
