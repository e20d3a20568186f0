use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::str::Utf8Error;
use petgraph::algo::Cycle;

#[derive(Debug)]
pub enum GlocalError {
    /// The input sequences can not be aligned as a set (empty, duplicate names, too many)
    InvalidSequenceSet(String),

    /// The lattice does not contain a final state with a usable score table
    UnreachableFinalState,

    /// Backtracking found a cell that none of its possible predecessors explains
    InconsistentTable { state: usize, coords: Vec<usize> },

    /// The score tables would exceed the addressable or configured number of cells,
    /// or the allocation itself failed
    ResourceExhausted { requested: Option<usize> },

    /// Error indicating the state lattice is in an invalid state
    GraphError,

    /// Error variant for malformed collaborator input files
    ParseError { line: usize, msg: String },

    /// Error variant when we could not serialize an alignment
    SerializationError { source: serde_json::Error },

    /// Non UTF-8 sequence names
    Utf8Error(Utf8Error),

    /// Other IO errors
    IOError(io::Error),
}

impl GlocalError {
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::ParseError { line, msg: msg.into() }
    }
}

impl Error for GlocalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            Self::SerializationError { ref source } => Some(source),
            Self::Utf8Error(ref source) => Some(source),
            Self::IOError(ref source) => Some(source),
            _ => None
        }
    }
}

impl<N> From<Cycle<N>> for GlocalError {
    fn from(_: Cycle<N>) -> Self {
        Self::GraphError
    }
}

impl From<io::Error> for GlocalError {
    fn from(value: io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<Utf8Error> for GlocalError {
    fn from(value: Utf8Error) -> Self {
        Self::Utf8Error(value)
    }
}

impl From<serde_json::Error> for GlocalError {
    fn from(value: serde_json::Error) -> Self {
        Self::SerializationError {
            source: value
        }
    }
}

impl Display for GlocalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::InvalidSequenceSet(ref reason) =>
                write!(f, "Invalid set of sequences: {reason}"),
            Self::UnreachableFinalState =>
                write!(f, "The state lattice has no reachable final state!"),
            Self::InconsistentTable { state, ref coords } =>
                write!(f, "Score table of state {state} is inconsistent at cell {coords:?}!"),
            Self::ResourceExhausted { requested: Some(cells) } =>
                write!(f, "Could not allocate score tables with {cells} cells!"),
            Self::ResourceExhausted { requested: None } =>
                write!(f, "The score tables do not fit into addressable memory!"),
            Self::GraphError =>
                write!(f, "The state lattice is in an invalid state (possibly a cycle?)."),
            Self::ParseError { line, ref msg } =>
                write!(f, "Parse error on line {line}: {msg}"),
            Self::SerializationError { source: _ } =>
                write!(f, "Could not serialize the alignment!"),
            Self::Utf8Error(ref err) =>
                err.fmt(f),
            Self::IOError(ref err) =>
                err.fmt(f),
        }
    }
}
