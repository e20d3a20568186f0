use std::sync::OnceLock;

use tracing::debug;

use crate::aligner::coords::{CoordVector, MovePatterns};
use crate::aligner::fill::{predecessor_entries, FillContext};
use crate::aligner::scoring::ScoreType;
use crate::aligner::table::ScoreTable;
use crate::errors::GlocalError;
use crate::lattice::LatticeState;
use crate::sequence::{BLANK, GAP};

/// Result of tracing back through the filled tables
pub(crate) struct Traceback<S> {
    pub score: S,

    /// Aligned rows, one per input sequence
    pub rows: Vec<Vec<u8>>,

    /// Visited states, from the initial side to the final state
    pub path: Vec<usize>,
}

/// Alignment rows under construction. Columns are pushed from the end of the alignment
/// towards its start.
struct ReversedRows<'a, S> {
    ctx: &'a FillContext<'a, S>,
    rows: Vec<Vec<u8>>,
}

impl<'a, S> ReversedRows<'a, S>
where
    S: ScoreType
{
    fn new(ctx: &'a FillContext<'a, S>) -> Self {
        Self {
            ctx,
            rows: vec![Vec::new(); ctx.sequences.len()],
        }
    }

    fn push_move(&mut self, state: &LatticeState, c: &[usize], pattern: u64) {
        for (seq, row) in self.rows.iter_mut().enumerate() {
            let symbol = match state.axis_of(seq) {
                Some(axis) if pattern & (1 << axis) != 0 => self.ctx.sequences[seq].get(c[axis] - 1),
                Some(_) => GAP,
                None => BLANK,
            };

            row.push(symbol);
        }
    }

    /// Columns holding `seq[from..to]`, skipped without being aligned to anything
    fn push_flank(&mut self, seq: usize, from: usize, to: usize) {
        for pos in (from..to).rev() {
            for (other, row) in self.rows.iter_mut().enumerate() {
                row.push(if other == seq { self.ctx.sequences[seq].get(pos) } else { BLANK });
            }
        }
    }

    fn into_rows(self) -> Vec<Vec<u8>> {
        self.rows.into_iter()
            .map(|mut row| {
                row.reverse();
                row
            })
            .collect()
    }
}

/// Pick the final state and cell to start from: the best scoring one, preferring
/// states with more active sequences, then lower state indices.
fn start_cell<S>(
    ctx: &FillContext<S>,
    tables: &[OnceLock<ScoreTable<S>>],
) -> Result<(usize, CoordVector, S), GlocalError>
where
    S: ScoreType
{
    let mut best: Option<(usize, CoordVector, S)> = None;

    for ix in ctx.lattice.finals() {
        let state = ctx.lattice.get(ix);
        let Some(table) = tables[ix].get() else {
            continue;
        };

        if table.is_void() {
            continue;
        }

        let anchored = state.active().iter()
            .any(|seq| ctx.sequences[*seq].is_global_right());

        let (coords, score) = if anchored {
            let corner = table.corner();
            let score = table.get(&corner);
            (corner, score)
        } else {
            match table.max_cell() {
                Some(cell) => cell,
                None => continue,
            }
        };

        if !score.is_finite() {
            continue;
        }

        let better = match &best {
            None => true,
            Some((best_ix, _, best_score)) => {
                if score.is_same_score(*best_score) {
                    state.active().len() > ctx.lattice.get(*best_ix).active().len()
                } else {
                    score > *best_score
                }
            }
        };

        if better {
            best = Some((ix, coords, score));
        }
    }

    best.ok_or(GlocalError::UnreachableFinalState)
}

pub(crate) fn backtrack<S>(
    ctx: &FillContext<S>,
    tables: &[OnceLock<ScoreTable<S>>],
) -> Result<Traceback<S>, GlocalError>
where
    S: ScoreType
{
    let (start_ix, start_coords, score) = start_cell(ctx, tables)?;
    debug!(state = start_ix, coords = ?start_coords, "Backtracking from final state with score {score}");

    let mut rows = ReversedRows::new(ctx);

    // Sequences that never started, and the unaligned ends of local sequences
    let start_state = ctx.lattice.get(start_ix);
    for seq in (0..ctx.sequences.len()).rev() {
        let len = ctx.sequences[seq].len();
        if let Some(axis) = start_state.axis_of(seq) {
            rows.push_flank(seq, start_coords[axis], len);
        } else if start_state.ready().contains(&seq) {
            rows.push_flank(seq, 0, len);
        }
    }

    let mut path = vec![start_ix];
    let mut state_ix = start_ix;
    let mut c = start_coords;
    let mut column = Vec::with_capacity(ctx.sequences.len());

    'walk: loop {
        let state = ctx.lattice.get(state_ix);
        let table = tables[state_ix].get()
            .ok_or(GlocalError::GraphError)?;
        let value = table.try_get(&c)
            .ok_or_else(|| GlocalError::InconsistentTable { state: state_ix, coords: c.to_vec() })?;

        for pattern in MovePatterns::new(c.positive_axes()) {
            let Some(prev) = c.step_back(pattern) else {
                continue;
            };

            let candidate = table.get(&prev) + ctx.move_score(state, &c, pattern, &mut column);
            if candidate.is_same_score(value) {
                rows.push_move(state, &c, pattern);
                c = prev;
                continue 'walk;
            }
        }

        if c.is_zero() && value.is_same_score(S::zero()) {
            break;
        }

        for (entry, pred_table) in predecessor_entries(ctx.lattice, state_ix, tables)? {
            let Some((pred_coords, candidate)) = entry.best_entry(pred_table, &c) else {
                continue;
            };

            if !candidate.is_same_score(value) {
                continue;
            }

            let pred = ctx.lattice.get(entry.pred());

            // Suffix of a sequence that finished between the two states
            for (pred_axis, seq) in pred.active().iter().enumerate() {
                if state.axis_of(*seq).is_none() {
                    rows.push_flank(*seq, pred_coords[pred_axis], ctx.sequences[*seq].len());
                }
            }

            // Prefix of a sequence that got activated between the two states
            for (axis, seq) in state.active().iter().enumerate() {
                if pred.axis_of(*seq).is_none() {
                    rows.push_flank(*seq, 0, c[axis]);
                }
            }

            state_ix = entry.pred();
            c = pred_coords;
            path.push(state_ix);
            continue 'walk;
        }

        return Err(GlocalError::InconsistentTable {
            state: state_ix,
            coords: c.to_vec(),
        });
    }

    // Sequences that finished before anything got aligned
    let stop_state = ctx.lattice.get(state_ix);
    for seq in stop_state.done().iter().rev() {
        rows.push_flank(*seq, 0, ctx.sequences[*seq].len());
    }

    path.reverse();

    Ok(Traceback {
        score,
        rows: rows.into_rows(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::schedule::fill_sequential;
    use crate::aligner::scoring::{ColumnScorer, Scoring};
    use crate::lattice::Lattice;
    use crate::sequence::Sequence;

    #[test]
    fn test_start_cell_ties() {
        // Nothing to gain from aligning, every non-void final state scores 0
        let seqs = vec![Sequence::local("a", "A"), Sequence::local("b", "C")];
        let lattice = Lattice::from_sequences(&seqs);
        let scorer = ColumnScorer::new(&Scoring::<f32>::default());
        let ctx = FillContext { sequences: &seqs, lattice: &lattice, scorer: &scorer };
        let mut tables = fill_sequential(&ctx).unwrap();

        assert_eq!(lattice.get(3).label(), "_0,1_");
        let (state_ix, coords, score) = start_cell(&ctx, &tables).unwrap();
        assert_eq!(state_ix, 3);
        assert_eq!(coords, CoordVector::from_slice(&[0, 0]));
        assert_eq!(score, 0.0);

        // Among the states with a single active sequence, the lowest index wins
        *tables[3].get_mut().unwrap() = ScoreTable::void();
        let (state_ix, coords, score) = start_cell(&ctx, &tables).unwrap();
        assert_eq!(lattice.get(state_ix).label(), "1_0_");
        assert_eq!(state_ix, 1);
        assert_eq!(coords, CoordVector::from_slice(&[0]));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_unexplained_cell() {
        let seqs = vec![Sequence::global("a", "ACGT"), Sequence::global("b", "AGT")];
        let lattice = Lattice::from_sequences(&seqs);
        let scorer = ColumnScorer::new(&Scoring::<f32>::default());
        let ctx = FillContext { sequences: &seqs, lattice: &lattice, scorer: &scorer };
        let mut tables = fill_sequential(&ctx).unwrap();

        let table = tables[0].get_mut().unwrap();
        let corner = table.corner();
        table.set(&corner, 100.0);

        match backtrack(&ctx, &tables) {
            Err(GlocalError::InconsistentTable { state, coords }) => {
                assert_eq!(state, 0);
                assert_eq!(coords, vec![4, 3]);
            },
            _ => panic!("expected an inconsistent table"),
        }
    }

    #[test]
    fn test_no_usable_final_state() {
        let seqs = vec![Sequence::global("a", "AC"), Sequence::global("b", "A")];
        let lattice = Lattice::from_sequences(&seqs);
        let scorer = ColumnScorer::new(&Scoring::<f32>::default());
        let ctx = FillContext { sequences: &seqs, lattice: &lattice, scorer: &scorer };
        let mut tables = fill_sequential(&ctx).unwrap();

        let table = tables[0].get_mut().unwrap();
        let corner = table.corner();
        table.set(&corner, f32::NEG_INFINITY);

        assert!(matches!(start_cell(&ctx, &tables), Err(GlocalError::UnreachableFinalState)));
    }
}
