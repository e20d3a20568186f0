pub mod fasta;
pub mod lattice;
pub mod locality;
pub mod output;
pub mod scores;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::errors::GlocalError;

pub use fasta::{load_sequences, read_sequences};
pub use lattice::lattice_to_dot;
pub use locality::{apply_locality, load_locality};
pub use output::{write_alignment, write_settings, OutputFormat};
pub use scores::{load_codes, load_codes_or_default, load_matrix, read_codes, read_matrix};

/// Open a file for reading, transparently decompressing it if its name ends in `.gz`
pub fn open_input(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>, GlocalError> {
    let p = path.as_ref();
    let is_gzipped = p
        .file_name()
        .map(|v| v.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gzipped {
        Box::new(File::open(p).map(MultiGzDecoder::new).map(BufReader::new)?)
    } else {
        Box::new(File::open(p).map(BufReader::new)?)
    };

    Ok(reader)
}

/// The non-empty lines of a text file with trailing comments removed, together with
/// their (one-based) line numbers.
pub(crate) fn content_lines<R: BufRead>(reader: R, comment: char) -> Result<Vec<(usize, String)>, GlocalError> {
    let mut lines = Vec::new();

    for (ix, line) in reader.lines().enumerate() {
        let line = line?;
        let content = match line.find(comment) {
            Some(pos) => &line[..pos],
            None => &line[..],
        }.trim();

        if !content.is_empty() {
            lines.push((ix + 1, content.to_string()));
        }
    }

    Ok(lines)
}
