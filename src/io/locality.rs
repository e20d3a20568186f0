//! Boundary conditions per sequence.
//!
//! The file lists, for each sequence to change, a `>name` line followed by a line with two
//! booleans: whether the sequence is global at its left end and at its right end.
//!
//! ```text
//! # reference stays global
//! >read1
//! false false
//! ```

use std::io::BufRead;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::errors::GlocalError;
use crate::io::{content_lines, open_input};
use crate::sequence::Sequence;

/// Parse a locality file into `(global_left, global_right)` per sequence name
pub fn read_locality<R: BufRead>(reader: R) -> Result<FxHashMap<String, (bool, bool)>, GlocalError> {
    let lines = content_lines(reader, '#')?;
    let mut locality = FxHashMap::default();

    let mut iter = lines.into_iter();
    while let Some((line_no, line)) = iter.next() {
        let Some(name) = line.strip_prefix('>') else {
            return Err(GlocalError::parse(line_no, format!("expected '>name', got '{line}'")));
        };

        let Some((flags_line_no, flags)) = iter.next() else {
            return Err(GlocalError::parse(line_no, format!("missing boundary flags for '{name}'")));
        };

        let values = flags.split_whitespace()
            .map(|v| v.parse::<bool>()
                .map_err(|_| GlocalError::parse(flags_line_no, format!("invalid boolean '{v}'"))))
            .collect::<Result<Vec<_>, _>>()?;

        let &[global_left, global_right] = values.as_slice() else {
            return Err(GlocalError::parse(flags_line_no, "expected '<global_left> <global_right>'"));
        };

        locality.insert(name.trim().to_string(), (global_left, global_right));
    }

    Ok(locality)
}

/// Set the boundary conditions of the named sequences
pub fn apply_locality<R: BufRead>(sequences: &mut [Sequence], reader: R) -> Result<(), GlocalError> {
    let mut locality = read_locality(reader)?;

    for seq in sequences.iter_mut() {
        if let Some((global_left, global_right)) = locality.remove(seq.name()) {
            seq.set_boundaries(global_left, global_right);
        }
    }

    if let Some(unknown) = locality.keys().min() {
        return Err(GlocalError::parse(0, format!("locality given for unknown sequence '{unknown}'")));
    }

    Ok(())
}

pub fn load_locality(sequences: &mut [Sequence], path: impl AsRef<Path>) -> Result<(), GlocalError> {
    apply_locality(sequences, open_input(path)?)
}
