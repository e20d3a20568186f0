pub mod codes;
pub mod matrix;

use std::fmt::{Debug, Display};

use num::{Float, FromPrimitive};
use serde::Serialize;

use crate::sequence::GAP;

pub use codes::AmbiguityCodes;
pub use matrix::SubstitutionMatrix;

pub const DEFAULT_MATCH: f64 = 4.0;
pub const DEFAULT_MISMATCH: f64 = -2.0;
pub const DEFAULT_GAP: f64 = -9.0;

/// Floating point type used for alignment scores and score table cells
pub trait ScoreType: Float + FromPrimitive + Default + Debug + Display + Serialize + Send + Sync + 'static {
    /// Relative tolerance when comparing a stored cell with a re-derived value
    fn tolerance() -> Self;

    fn from_score(value: f64) -> Self;

    /// Equality up to rounding, used when backtracking re-derives a cell value
    #[inline]
    fn is_same_score(self, other: Self) -> bool {
        if self == other {
            return true;
        }

        if !self.is_finite() || !other.is_finite() {
            return false;
        }

        let scale = self.abs().max(other.abs()).max(Self::one());
        (self - other).abs() <= Self::tolerance() * scale
    }
}

impl ScoreType for f32 {
    #[inline(always)]
    fn tolerance() -> Self {
        1e-5
    }

    #[inline(always)]
    fn from_score(value: f64) -> Self {
        value as f32
    }
}

impl ScoreType for f64 {
    #[inline(always)]
    fn tolerance() -> Self {
        1e-10
    }

    #[inline(always)]
    fn from_score(value: f64) -> Self {
        value
    }
}

/// Pairwise symbol scoring with optional substitution matrix and ambiguity codes.
///
/// Without a matrix the linear default scheme is used: equal symbols score
/// `match_score` (0 for two gaps), a symbol against a gap scores `gap_score` and
/// two different symbols score `mismatch_score`.
#[derive(Clone, Debug)]
pub struct Scoring<S> {
    match_score: S,
    mismatch_score: S,
    gap_score: S,
    matrix: Option<SubstitutionMatrix<S>>,
    codes: AmbiguityCodes,
}

impl<S> Scoring<S>
where
    S: ScoreType
{
    pub fn new(match_score: S, mismatch_score: S, gap_score: S) -> Self {
        Self {
            match_score,
            mismatch_score,
            gap_score,
            matrix: None,
            codes: AmbiguityCodes::default(),
        }
    }

    pub fn with_matrix(mut self, matrix: SubstitutionMatrix<S>) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn with_codes(mut self, codes: AmbiguityCodes) -> Self {
        self.codes = codes;
        self
    }

    #[inline]
    pub fn match_score(&self) -> S {
        self.match_score
    }

    #[inline]
    pub fn mismatch_score(&self) -> S {
        self.mismatch_score
    }

    #[inline]
    pub fn gap_score(&self) -> S {
        self.gap_score
    }

    pub fn matrix(&self) -> Option<&SubstitutionMatrix<S>> {
        self.matrix.as_ref()
    }

    pub fn codes(&self) -> &AmbiguityCodes {
        &self.codes
    }

    #[inline]
    pub fn default_score(&self, a: u8, b: u8) -> S {
        if a == b {
            if a == GAP {
                S::zero()
            } else {
                self.match_score
            }
        } else if a == GAP || b == GAP {
            self.gap_score
        } else {
            self.mismatch_score
        }
    }

    /// Score of aligning symbol `a` against symbol `b`.
    ///
    /// Ambiguity codes are resolved optimistically: the best score over all concrete
    /// symbols the codes stand for.
    pub fn score(&self, a: u8, b: u8) -> S {
        let Some(matrix) = &self.matrix else {
            return self.default_score(a, b);
        };

        let a_in_matrix = matrix.contains(a);
        let b_in_matrix = matrix.contains(b);
        if a_in_matrix && b_in_matrix {
            return matrix.get(a, b);
        }

        let a_code = self.codes.expand(a);
        let b_code = self.codes.expand(b);
        if (!a_in_matrix && a_code.is_none()) || (!b_in_matrix && b_code.is_none()) {
            return self.default_score(a, b);
        }

        let single_a = [a];
        let single_b = [b];
        let expanded_a = if a_in_matrix { &single_a[..] } else { a_code.unwrap_or(&single_a[..]) };
        let expanded_b = if b_in_matrix { &single_b[..] } else { b_code.unwrap_or(&single_b[..]) };

        let mut best = S::neg_infinity();
        for &x in expanded_a {
            for &y in expanded_b {
                let pair = matrix.try_get(x, y)
                    .unwrap_or_else(|| self.default_score(x, y));

                best = best.max(pair);
            }
        }

        best
    }

    /// Sum-of-pairs score of an alignment column
    pub fn column_score(&self, column: &[u8]) -> S {
        let mut total = S::zero();
        for (i, a) in column.iter().enumerate() {
            for b in &column[i+1..] {
                total = total + self.score(*a, *b);
            }
        }

        total
    }
}

impl<S> Default for Scoring<S>
where
    S: ScoreType
{
    fn default() -> Self {
        Self::new(
            S::from_score(DEFAULT_MATCH),
            S::from_score(DEFAULT_MISMATCH),
            S::from_score(DEFAULT_GAP),
        )
    }
}

/// Precomputed pair scores for every byte symbol, so filling a score table never
/// resolves ambiguity codes or matrix lookups in its inner loop.
pub struct ColumnScorer<S> {
    pairs: Vec<S>,
}

impl<S> ColumnScorer<S>
where
    S: ScoreType
{
    pub fn new(scoring: &Scoring<S>) -> Self {
        let mut pairs = Vec::with_capacity(256 * 256);
        for a in 0..=u8::MAX {
            for b in 0..=u8::MAX {
                pairs.push(scoring.score(a, b));
            }
        }

        Self { pairs }
    }

    #[inline(always)]
    pub fn pair(&self, a: u8, b: u8) -> S {
        self.pairs[(a as usize) << 8 | b as usize]
    }

    /// Sum-of-pairs score of a column
    #[inline]
    pub fn column(&self, column: &[u8]) -> S {
        let mut total = S::zero();
        for (i, a) in column.iter().enumerate() {
            for b in &column[i+1..] {
                total = total + self.pair(*a, *b);
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dna_matrix() -> SubstitutionMatrix<f32> {
        SubstitutionMatrix::new(
            b"ACGT".to_vec(),
            vec![
                vec![5.0, -4.0, -4.0, -4.0],
                vec![-4.0, 5.0, -4.0, -4.0],
                vec![-4.0, -4.0, 5.0, -4.0],
                vec![-4.0, -4.0, -4.0, 5.0],
            ],
            -7.0,
        ).unwrap()
    }

    #[test]
    fn test_default_scheme() {
        let scoring = Scoring::<f32>::default();

        assert_eq!(scoring.score(b'A', b'A'), 4.0);
        assert_eq!(scoring.score(b'A', b'C'), -2.0);
        assert_eq!(scoring.score(b'A', GAP), -9.0);
        assert_eq!(scoring.score(GAP, b'T'), -9.0);
        assert_eq!(scoring.score(GAP, GAP), 0.0);
    }

    #[test]
    fn test_matrix_and_codes() {
        let mut codes = AmbiguityCodes::default();
        codes.insert(b'R', b"AG");
        codes.insert(b'N', b"ACGT");

        let scoring = Scoring::<f32>::default()
            .with_matrix(dna_matrix())
            .with_codes(codes);

        assert_eq!(scoring.score(b'A', b'T'), -4.0);
        assert_eq!(scoring.score(b'C', GAP), -7.0);
        assert_eq!(scoring.score(GAP, GAP), 0.0);

        // Optimistic resolution of ambiguity codes
        assert_eq!(scoring.score(b'R', b'G'), 5.0);
        assert_eq!(scoring.score(b'R', b'C'), -4.0);
        assert_eq!(scoring.score(b'N', b'R'), 5.0);

        // Unknown symbols fall back on the default scheme
        assert_eq!(scoring.score(b'X', b'X'), 4.0);
        assert_eq!(scoring.score(b'X', b'A'), -2.0);
    }

    #[test]
    fn test_column_score_sum_of_pairs() {
        let scoring = Scoring::<f32>::default();
        assert_eq!(scoring.column_score(b"AAA"), 12.0);
        assert_eq!(scoring.column_score(b"AA-"), 4.0 - 9.0 - 9.0);
        assert_eq!(scoring.column_score(b"A--"), -18.0);
        assert_eq!(scoring.column_score(b"A"), 0.0);

        let scorer = ColumnScorer::new(&scoring);
        assert_eq!(scorer.column(b"AA-"), scoring.column_score(b"AA-"));
        assert_eq!(scorer.pair(b'C', b'G'), -2.0);
    }

    #[test]
    fn test_same_score() {
        assert!(3.0f32.is_same_score(3.0));
        assert!((0.1f32 + 0.2).is_same_score(0.3));
        assert!(!3.0f32.is_same_score(4.0));
        assert!(!f32::NEG_INFINITY.is_same_score(0.0));
        assert!(f32::NEG_INFINITY.is_same_score(f32::NEG_INFINITY));
    }
}
