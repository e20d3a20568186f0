use std::io::{BufRead, Write};
use std::path::Path;

use noodles::fasta::{self as fasta, record::{Definition, Sequence as FastaSequence}, Record};

use crate::aligner::Alignment;
use crate::errors::GlocalError;
use crate::io::open_input;
use crate::sequence::{Sequence, BLANK, GAP};

/// Read all records of a FASTA file. Symbols are upper-cased and every sequence starts out
/// global at both ends.
pub fn read_sequences<R: BufRead>(reader: R) -> Result<Vec<Sequence>, GlocalError> {
    let mut reader = fasta::io::Reader::new(reader);

    let mut sequences = Vec::new();
    for result in reader.records() {
        let record = result?;
        let name = std::str::from_utf8(record.name())?;
        let symbols = record.sequence().as_ref().to_ascii_uppercase();

        sequences.push(Sequence::global(name, symbols));
    }

    Ok(sequences)
}

pub fn load_sequences(path: impl AsRef<Path>) -> Result<Vec<Sequence>, GlocalError> {
    read_sequences(open_input(path)?)
}

/// Write the aligned rows as FASTA. Positions outside the aligned part of a sequence are
/// written as gaps.
pub fn write_alignment_fasta<S, W>(alignment: &Alignment<S>, output: W) -> Result<(), GlocalError>
where
    W: Write
{
    let mut writer = fasta::io::Writer::new(output);

    for seq in &alignment.sequences {
        let header = Definition::new(seq.name().to_owned(), None);
        let row = FastaSequence::from_iter(seq.symbols().iter()
            .map(|s| if *s == BLANK { GAP } else { *s }));

        writer.write_record(&Record::new(header, row))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_sequences() {
        let data = b">s1 first\nacgt\nAC\n>s2\nNNA\n";
        let seqs = read_sequences(&data[..]).unwrap();

        assert_eq!(seqs.len(), 2);
        assert_eq!(seqs[0].name(), "s1");
        assert_eq!(seqs[0].symbols(), b"ACGTAC");
        assert!(seqs[0].is_global_left() && seqs[0].is_global_right());
        assert_eq!(seqs[1].symbols(), b"NNA");
    }
}
