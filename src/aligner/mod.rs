pub mod alignment;
pub mod config;
pub mod coords;
pub mod scoring;
pub mod table;

mod backtrack;
mod fill;
mod schedule;

use std::time::Instant;

use rustc_hash::FxHashSet;
use tracing::{info, span, Level};

use crate::aligner::coords::MAX_AXES;
use crate::aligner::fill::FillContext;
use crate::aligner::scoring::{ColumnScorer, ScoreType, Scoring};
use crate::aligner::table::ScoreTable;
use crate::errors::GlocalError;
use crate::lattice::Lattice;
use crate::sequence::Sequence;

pub use alignment::Alignment;
pub use config::AlignerConfig;

/// Multiple sequence aligner where each sequence is aligned globally or locally at each of its
/// ends, as given by its boundary flags.
pub struct GlocalAligner<S = f32> {
    scoring: Scoring<S>,
    config: AlignerConfig,
}

impl<S> GlocalAligner<S>
where
    S: ScoreType
{
    pub fn new(scoring: Scoring<S>) -> Self {
        Self {
            scoring,
            config: AlignerConfig::default(),
        }
    }

    pub fn with_config(scoring: Scoring<S>, config: AlignerConfig) -> Self {
        Self {
            scoring,
            config,
        }
    }

    pub fn scoring(&self) -> &Scoring<S> {
        &self.scoring
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    pub fn align(&self, sequences: &[Sequence]) -> Result<Alignment<S>, GlocalError> {
        let span = span!(Level::INFO, "align", sequences = sequences.len());
        let _enter = span.enter();

        validate(sequences)?;

        let start = Instant::now();
        let lattice = Lattice::from_sequences(sequences);
        info!("Built lattice with {} states in {:.2?}.", lattice.len(), start.elapsed());

        let total_cells = self.check_resources(sequences, &lattice)?;

        let start = Instant::now();
        let scorer = ColumnScorer::new(&self.scoring);
        let ctx = FillContext {
            sequences,
            lattice: &lattice,
            scorer: &scorer,
        };

        let tables = schedule::fill_tables(&ctx, self.config.threads)?;
        info!("Filled {} score tables ({} cells) in {:.2?}.", lattice.len(), total_cells, start.elapsed());

        let start = Instant::now();
        let traceback = backtrack::backtrack(&ctx, &tables)?;
        info!("Backtracking done in {:.2?}. Alignment score: {}", start.elapsed(), traceback.score);

        drop(tables);

        let aligned = sequences.iter()
            .zip(traceback.rows)
            .map(|(seq, row)| Sequence::new(seq.name(), row, seq.is_global_left(), seq.is_global_right()))
            .collect();

        Ok(Alignment {
            sequences: aligned,
            score: traceback.score,
            path: traceback.path,
            lattice,
        })
    }

    /// Total number of cells over all tables, if it stays within the configured limit
    fn check_resources(&self, sequences: &[Sequence], lattice: &Lattice) -> Result<usize, GlocalError> {
        let mut total: usize = 0;

        for state in lattice.states() {
            let extents: Vec<usize> = state.active().iter()
                .map(|seq| sequences[*seq].len().checked_add(1))
                .collect::<Option<_>>()
                .ok_or(GlocalError::ResourceExhausted { requested: None })?;

            total = ScoreTable::<S>::cell_count(&extents)
                .and_then(|cells| total.checked_add(cells))
                .ok_or(GlocalError::ResourceExhausted { requested: None })?;
        }

        if total > self.config.max_cells {
            return Err(GlocalError::ResourceExhausted { requested: Some(total) });
        }

        Ok(total)
    }
}

impl<S> Default for GlocalAligner<S>
where
    S: ScoreType
{
    fn default() -> Self {
        Self::new(Scoring::default())
    }
}

fn validate(sequences: &[Sequence]) -> Result<(), GlocalError> {
    if sequences.is_empty() {
        return Err(GlocalError::InvalidSequenceSet("no sequences given".to_string()));
    }

    if sequences.len() > MAX_AXES {
        return Err(GlocalError::InvalidSequenceSet(
            format!("{} sequences given, at most {MAX_AXES} are supported", sequences.len())));
    }

    let mut names = FxHashSet::default();
    for seq in sequences {
        if !names.insert(seq.name()) {
            return Err(GlocalError::InvalidSequenceSet(format!("duplicate sequence name '{}'", seq.name())));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(alignment: &Alignment<f32>) -> Vec<String> {
        alignment.sequences().iter()
            .map(|s| String::from_utf8_lossy(s.symbols()).into_owned())
            .collect()
    }

    fn assert_round_trip(inputs: &[Sequence], alignment: &Alignment<f32>) {
        let width = alignment.num_columns();
        for (input, aligned) in inputs.iter().zip(alignment.sequences()) {
            assert_eq!(aligned.name(), input.name());
            assert_eq!(aligned.len(), width);
            assert_eq!(aligned.ungapped(), input.symbols());
        }
    }

    /// Sum-of-pairs score over the columns of a global alignment
    fn column_sum(scoring: &Scoring<f32>, alignment: &Alignment<f32>) -> f32 {
        (0..alignment.num_columns())
            .map(|col| scoring.column_score(&alignment.column(col)))
            .sum()
    }

    /// Pairwise alignment score by the textbook recurrence. A local left end on either
    /// sequence lets the alignment start in any cell, since the other sequence then runs
    /// alone for free. A local right end likewise lets it stop in any cell.
    fn pairwise_reference(scoring: &Scoring<f32>, a: &Sequence, b: &Sequence) -> f32 {
        let free_start = !a.is_global_left() || !b.is_global_left();
        let free_end = !a.is_global_right() || !b.is_global_right();

        let mut h = vec![vec![f32::NEG_INFINITY; b.len() + 1]; a.len() + 1];
        let mut best = f32::NEG_INFINITY;
        for i in 0..=a.len() {
            for j in 0..=b.len() {
                let mut value = if free_start || (i == 0 && j == 0) { 0.0 } else { f32::NEG_INFINITY };
                if i > 0 && j > 0 {
                    value = value.max(h[i-1][j-1] + scoring.score(a.get(i-1), b.get(j-1)));
                }
                if i > 0 {
                    value = value.max(h[i-1][j] + scoring.gap_score());
                }
                if j > 0 {
                    value = value.max(h[i][j-1] + scoring.gap_score());
                }

                h[i][j] = value;
                best = best.max(value);
            }
        }

        if free_end { best } else { h[a.len()][b.len()] }
    }

    /// xorshift64, so every run checks the same cases
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn dna(&mut self, max_len: u64) -> Vec<u8> {
            let len = self.next() % (max_len + 1);
            (0..len)
                .map(|_| b"ACGT"[(self.next() % 4) as usize])
                .collect()
        }
    }

    #[test]
    fn test_two_global_sequences() {
        let seqs = vec![Sequence::global("s1", "ACGT"), Sequence::global("s2", "AGT")];
        let aligner = GlocalAligner::<f32>::default();
        let alignment = aligner.align(&seqs).unwrap();

        assert_eq!(alignment.score(), 3.0);
        assert_eq!(rows(&alignment), vec!["ACGT", "A-GT"]);
        assert_round_trip(&seqs, &alignment);
        assert_eq!(alignment.path(), &[0]);
    }

    #[test]
    fn test_three_identical_sequences() {
        let seqs = vec![
            Sequence::global("s1", "AA"),
            Sequence::global("s2", "AA"),
            Sequence::global("s3", "AA"),
        ];
        let alignment = GlocalAligner::<f32>::default().align(&seqs).unwrap();

        assert_eq!(alignment.score(), 24.0);
        assert_eq!(rows(&alignment), vec!["AA", "AA", "AA"]);
    }

    #[test]
    fn test_local_sequence_in_global_one() {
        let seqs = vec![Sequence::global("ref", "AAACGTAAA"), Sequence::local("read", "CGT")];
        let alignment = GlocalAligner::<f32>::default().align(&seqs).unwrap();

        assert_eq!(alignment.score(), 12.0);
        assert_eq!(rows(&alignment), vec!["AAACGTAAA", "   CGT   "]);
        assert_round_trip(&seqs, &alignment);
        assert_eq!(alignment.path(), &[0, 1, 2]);
    }

    #[test]
    fn test_global_matches_column_scores() {
        let scoring = Scoring::<f32>::new(2.0, -1.0, -3.0);
        let seqs = vec![
            Sequence::global("a", "GATTACA"),
            Sequence::global("b", "GCATGCT"),
            Sequence::global("c", "GATACA"),
        ];

        let alignment = GlocalAligner::new(scoring.clone()).align(&seqs).unwrap();
        assert_round_trip(&seqs, &alignment);
        assert_eq!(alignment.score(), column_sum(&scoring, &alignment));
    }

    #[test]
    fn test_round_trip_with_mixed_boundaries() {
        let seqs = vec![
            Sequence::new("a", "TTACGTACGGA", true, true),
            Sequence::new("b", "CCACGTAC", false, true),
            Sequence::new("c", "ACGTACGGATT", true, false),
            Sequence::local("d", "GGTACGGCC"),
        ];

        let alignment = GlocalAligner::<f32>::default().align(&seqs).unwrap();
        assert_round_trip(&seqs, &alignment);
        assert!(alignment.score().is_finite());

        let last = *alignment.path().last().unwrap();
        assert!(alignment.lattice().get(last).is_final());
        assert_eq!(alignment.lattice().get(last).active(), &[0, 1]);
    }

    #[test]
    fn test_local_right_end() {
        let seqs = vec![Sequence::global("a", "ACGT"), Sequence::new("b", "ACGTTTTT", true, false)];
        let alignment = GlocalAligner::<f32>::default().align(&seqs).unwrap();

        assert_eq!(alignment.score(), 16.0);
        assert_eq!(rows(&alignment), vec!["ACGT    ", "ACGTTTTT"]);
    }

    #[test]
    fn test_local_left_end() {
        let seqs = vec![Sequence::global("a", "ACGT"), Sequence::new("b", "TTTTACGT", false, true)];
        let alignment = GlocalAligner::<f32>::default().align(&seqs).unwrap();

        assert_eq!(alignment.score(), 16.0);
        assert_eq!(rows(&alignment), vec!["    ACGT", "TTTTACGT"]);
    }

    #[test]
    fn test_two_fully_local_sequences() {
        let seqs = vec![Sequence::local("a", "TTTACGTTT"), Sequence::local("b", "GGACGGG")];
        let alignment = GlocalAligner::<f32>::default().align(&seqs).unwrap();

        assert_eq!(alignment.score(), 12.0);
        assert_round_trip(&seqs, &alignment);
    }

    #[test]
    fn test_pairwise_scores_match_reference() {
        let scoring = Scoring::<f32>::default();
        let aligner = GlocalAligner::new(scoring.clone());
        let mut rng = XorShift(0x9e37_79b9_7f4a_7c15);

        for flags in 0..16u8 {
            for _ in 0..25 {
                let a = Sequence::new("a", rng.dna(7), flags & 1 != 0, flags & 2 != 0);
                let b = Sequence::new("b", rng.dna(7), flags & 4 != 0, flags & 8 != 0);
                let seqs = vec![a, b];

                let alignment = aligner.align(&seqs).unwrap();
                assert_eq!(
                    alignment.score(),
                    pairwise_reference(&scoring, &seqs[0], &seqs[1]),
                    "{} / {}", seqs[0], seqs[1]
                );
                assert_round_trip(&seqs, &alignment);
            }
        }
    }

    #[test]
    fn test_deterministic_and_thread_independent() {
        let seqs = vec![
            Sequence::global("a", "ACGTTGCAAC"),
            Sequence::local("b", "TTGCA"),
            Sequence::new("c", "GTTGCAACC", false, true),
        ];

        let sequential = GlocalAligner::<f32>::default().align(&seqs).unwrap();
        let again = GlocalAligner::<f32>::default().align(&seqs).unwrap();
        let parallel = GlocalAligner::with_config(
            Scoring::<f32>::default(),
            AlignerConfig::default().with_threads(3),
        ).align(&seqs).unwrap();

        assert_eq!(sequential.score(), again.score());
        assert_eq!(sequential.score(), parallel.score());
        assert_eq!(rows(&sequential), rows(&parallel));
    }

    #[test]
    fn test_f64_scores() {
        let seqs = vec![Sequence::global("s1", "ACGT"), Sequence::global("s2", "AGT")];
        let alignment = GlocalAligner::<f64>::default().align(&seqs).unwrap();

        assert_eq!(alignment.score(), 3.0);
    }

    #[test]
    fn test_empty_sequence() {
        let seqs = vec![Sequence::global("s1", "ACG"), Sequence::global("s2", "")];
        let alignment = GlocalAligner::<f32>::default().align(&seqs).unwrap();

        assert_eq!(alignment.score(), -27.0);
        assert_eq!(alignment.sequences()[1].symbols(), b"---");
    }

    #[test]
    fn test_invalid_inputs() {
        let aligner = GlocalAligner::<f32>::default();

        assert!(matches!(aligner.align(&[]), Err(GlocalError::InvalidSequenceSet(_))));

        let duplicates = vec![Sequence::global("s", "A"), Sequence::global("s", "C")];
        assert!(matches!(aligner.align(&duplicates), Err(GlocalError::InvalidSequenceSet(_))));

        let too_many: Vec<_> = (0..64)
            .map(|i| Sequence::global(format!("s{i}"), "A"))
            .collect();
        assert!(matches!(aligner.align(&too_many), Err(GlocalError::InvalidSequenceSet(_))));
    }

    #[test]
    fn test_cell_limit() {
        let seqs = vec![Sequence::global("s1", "ACGT"), Sequence::global("s2", "AGT")];
        let aligner = GlocalAligner::with_config(
            Scoring::<f32>::default(),
            AlignerConfig::default().with_max_cells(10),
        );

        assert!(matches!(
            aligner.align(&seqs),
            Err(GlocalError::ResourceExhausted { requested: Some(20) })
        ));
    }
}
