use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Maps ambiguity codes (e.g. `N`, `R`) to the concrete symbols they stand for
#[derive(Clone, Debug, Default)]
pub struct AmbiguityCodes {
    codes: FxHashMap<u8, SmallVec<[u8; 4]>>,
}

impl AmbiguityCodes {
    /// The IUPAC nucleotide codes
    pub fn iupac_nucleotides() -> Self {
        let mut codes = Self::default();
        for (code, symbols) in [
            (b'R', &b"AG"[..]),
            (b'Y', &b"CT"[..]),
            (b'S', &b"GC"[..]),
            (b'W', &b"AT"[..]),
            (b'K', &b"GT"[..]),
            (b'M', &b"AC"[..]),
            (b'B', &b"CGT"[..]),
            (b'D', &b"AGT"[..]),
            (b'H', &b"ACT"[..]),
            (b'V', &b"ACG"[..]),
            (b'N', &b"ACGT"[..]),
        ] {
            codes.insert(code, symbols);
        }

        codes
    }

    pub fn insert(&mut self, code: u8, symbols: &[u8]) {
        self.codes.insert(code, SmallVec::from_slice(symbols));
    }

    #[inline]
    pub fn expand(&self, code: u8) -> Option<&[u8]> {
        self.codes.get(&code).map(|v| v.as_slice())
    }

    pub fn contains(&self, code: u8) -> bool {
        self.codes.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=(u8, &[u8])> + '_ {
        self.codes.iter().map(|(code, symbols)| (*code, symbols.as_slice()))
    }
}
