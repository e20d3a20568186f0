use serde::Serialize;

use crate::lattice::Lattice;
use crate::sequence::Sequence;

/// An optimal alignment of a set of sequences.
///
/// Every aligned sequence has the same length and keeps the name and boundary
/// conditions of its input. Positions where an active sequence does not advance hold
/// a gap, positions outside the aligned part of a sequence hold a blank.
#[derive(Clone, Debug, Serialize)]
pub struct Alignment<S> {
    pub sequences: Vec<Sequence>,
    pub score: S,

    /// Lattice states the alignment passes through, in alignment order
    pub path: Vec<usize>,

    pub lattice: Lattice,
}

impl<S> Alignment<S>
where
    S: Copy
{
    pub fn score(&self) -> S {
        self.score
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn num_columns(&self) -> usize {
        self.sequences.first()
            .map_or(0, |s| s.len())
    }

    pub fn column(&self, col: usize) -> Vec<u8> {
        self.sequences.iter()
            .map(|s| s.get(col))
            .collect()
    }
}
