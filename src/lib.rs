pub mod aligner;
pub mod errors;
pub mod io;
pub mod lattice;
pub mod sequence;

pub use aligner::{AlignerConfig, Alignment, GlocalAligner};
pub use aligner::scoring::Scoring;
pub use errors::GlocalError;
pub use sequence::Sequence;
