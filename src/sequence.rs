use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Symbol used for a position where an active sequence does not advance
pub const GAP: u8 = b'-';

/// Symbol used for a position where a sequence does not take part in the alignment phase
pub const BLANK: u8 = b' ';

/// A named sequence of symbols together with its boundary conditions.
///
/// `global_left` requires the sequence to be aligned from its first symbol on,
/// `global_right` requires it to be aligned up to its last symbol. A sequence that
/// is local at an end may skip a prefix (or suffix) without penalty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    name: String,
    symbols: Vec<u8>,
    global_left: bool,
    global_right: bool,
}

impl Sequence {
    pub fn new(name: impl Into<String>, symbols: impl Into<Vec<u8>>, global_left: bool, global_right: bool) -> Self {
        Self {
            name: name.into(),
            symbols: symbols.into(),
            global_left,
            global_right,
        }
    }

    /// Create a sequence that is global at both ends
    pub fn global(name: impl Into<String>, symbols: impl Into<Vec<u8>>) -> Self {
        Self::new(name, symbols, true, true)
    }

    /// Create a sequence that is local at both ends
    pub fn local(name: impl Into<String>, symbols: impl Into<Vec<u8>>) -> Self {
        Self::new(name, symbols, false, false)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[inline]
    pub fn get(&self, pos: usize) -> u8 {
        self.symbols[pos]
    }

    #[inline]
    pub fn is_global_left(&self) -> bool {
        self.global_left
    }

    #[inline]
    pub fn is_global_right(&self) -> bool {
        self.global_right
    }

    /// Neither end is global
    pub fn is_fully_local(&self) -> bool {
        !self.global_left && !self.global_right
    }

    pub(crate) fn set_boundaries(&mut self, global_left: bool, global_right: bool) {
        self.global_left = global_left;
        self.global_right = global_right;
    }

    /// The symbols with gap and blank positions removed
    pub fn ungapped(&self) -> Vec<u8> {
        self.symbols.iter()
            .copied()
            .filter(|s| *s != GAP && *s != BLANK)
            .collect()
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let open = if self.global_left { '[' } else { '(' };
        let close = if self.global_right { ']' } else { ')' };

        write!(f, "{}:\t{}{}{}", self.name, open, String::from_utf8_lossy(&self.symbols), close)
    }
}
