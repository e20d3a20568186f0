use crate::aligner::scoring::ScoreType;
use crate::errors::GlocalError;
use crate::sequence::GAP;

/// An explicit symbol-pair score table (e.g. BLOSUM, PAM or a custom DNA matrix).
///
/// A matrix that does not list the gap symbol itself gets a gap row and column
/// scoring `gap_score` against every symbol and 0 against another gap.
#[derive(Clone, Debug)]
pub struct SubstitutionMatrix<S> {
    alphabet: Vec<u8>,
    symbol_index: [Option<usize>; 256],
    scores: Vec<S>,
}

impl<S> SubstitutionMatrix<S>
where
    S: ScoreType
{
    pub fn new(alphabet: Vec<u8>, rows: Vec<Vec<S>>, gap_score: S) -> Result<Self, GlocalError> {
        if rows.len() != alphabet.len() || rows.iter().any(|row| row.len() != alphabet.len()) {
            return Err(GlocalError::parse(0, format!(
                "substitution matrix must be square with {} rows and columns", alphabet.len())));
        }

        let mut symbol_index = [None; 256];
        for (i, symbol) in alphabet.iter().enumerate() {
            if symbol_index[*symbol as usize].replace(i).is_some() {
                return Err(GlocalError::parse(0, format!(
                    "symbol '{}' occurs twice in the substitution matrix", char::from(*symbol))));
            }
        }

        let mut alphabet = alphabet;
        let has_gap = symbol_index[GAP as usize].is_some();
        let size = if has_gap { alphabet.len() } else { alphabet.len() + 1 };

        let mut scores = vec![S::zero(); size * size];
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                scores[i * size + j] = *value;
            }
        }

        if !has_gap {
            let gap_ix = alphabet.len();
            for i in 0..gap_ix {
                scores[i * size + gap_ix] = gap_score;
                scores[gap_ix * size + i] = gap_score;
            }
            scores[gap_ix * size + gap_ix] = S::zero();

            symbol_index[GAP as usize] = Some(gap_ix);
            alphabet.push(GAP);
        }

        Ok(Self { alphabet, symbol_index, scores })
    }

    pub fn alphabet(&self) -> &[u8] {
        &self.alphabet
    }

    #[inline]
    pub fn contains(&self, symbol: u8) -> bool {
        self.symbol_index[symbol as usize].is_some()
    }

    #[inline]
    pub fn try_get(&self, a: u8, b: u8) -> Option<S> {
        let i = self.symbol_index[a as usize]?;
        let j = self.symbol_index[b as usize]?;

        Some(self.scores[i * self.alphabet.len() + j])
    }

    /// Matrix entry for two symbols that are both part of the alphabet
    #[inline]
    pub fn get(&self, a: u8, b: u8) -> S {
        self.try_get(a, b)
            .unwrap_or_else(S::neg_infinity)
    }
}
