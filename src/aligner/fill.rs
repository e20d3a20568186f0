//! Filling the score table of a single lattice state.

use std::sync::OnceLock;

use smallvec::SmallVec;
use tracing::debug;

use crate::aligner::coords::{sweep, AxisMask, CoordVector, MovePatterns};
use crate::aligner::scoring::{ColumnScorer, ScoreType};
use crate::aligner::table::ScoreTable;
use crate::errors::GlocalError;
use crate::lattice::{Lattice, LatticeState};
use crate::sequence::{Sequence, GAP};

/// Everything needed to fill or backtrack through the tables of a lattice
pub(crate) struct FillContext<'a, S> {
    pub sequences: &'a [Sequence],
    pub lattice: &'a Lattice,
    pub scorer: &'a ColumnScorer<S>,
}

impl<S> FillContext<'_, S>
where
    S: ScoreType
{
    pub fn extents(&self, state: &LatticeState) -> SmallVec<[usize; 8]> {
        state.active().iter()
            .map(|seq| self.sequences[*seq].len() + 1)
            .collect()
    }

    /// Score of the column that advances the sequences in `pattern` by one, ending at `c`.
    ///
    /// On an axis edge only one sequence can advance; its symbol is scored against a gap
    /// once per other active sequence.
    pub fn move_score(&self, state: &LatticeState, c: &[usize], pattern: AxisMask, column: &mut Vec<u8>) -> S {
        let active = state.active();
        let positive = c.iter().filter(|v| **v > 0).count();

        if positive == 1 {
            let axis = pattern.trailing_zeros() as usize;
            let symbol = self.sequences[active[axis]].get(c[axis] - 1);

            return self.scorer.pair(symbol, GAP) * S::from_score((active.len() - 1) as f64);
        }

        column.clear();
        column.extend(active.iter()
            .enumerate()
            .map(|(axis, seq)| {
                if pattern & (1 << axis) != 0 {
                    self.sequences[*seq].get(c[axis] - 1)
                } else {
                    GAP
                }
            }));

        self.scorer.column(column)
    }
}

/// How the axes of a predecessor's table line up with the axes of a state's table.
///
/// The predecessor either lacks one of the state's sequences (it gets activated in
/// between) or has an extra one (it finished in between).
pub(crate) struct EntryMap {
    pred: usize,

    /// For every predecessor axis, the state axis of the same sequence
    shared: SmallVec<[Option<usize>; 8]>,
}

impl EntryMap {
    pub fn new(pred_ix: usize, pred: &LatticeState, state: &LatticeState) -> Self {
        Self {
            pred: pred_ix,
            shared: pred.active().iter()
                .map(|seq| state.axis_of(*seq))
                .collect(),
        }
    }

    pub fn pred(&self) -> usize {
        self.pred
    }

    /// The best predecessor cell that agrees with `c` on the shared axes. Coordinates on
    /// the other predecessor axes range over their whole extent. Ties resolve to the cell
    /// with the lowest coordinates, first axis first.
    pub fn best_entry<S>(&self, pred_table: &ScoreTable<S>, c: &[usize]) -> Option<(CoordVector, S)>
    where
        S: ScoreType
    {
        if pred_table.is_void() {
            return None;
        }

        let extents = pred_table.extents();
        let mut coords: CoordVector = self.shared.iter()
            .map(|axis| axis.map_or(0, |a| c[a]))
            .collect();

        let free: SmallVec<[usize; 2]> = self.shared.iter()
            .enumerate()
            .filter(|(_, axis)| axis.is_none())
            .map(|(pred_axis, _)| pred_axis)
            .collect();

        let mut best: Option<(CoordVector, S)> = None;
        loop {
            let value = pred_table.get(&coords);
            match best {
                Some((_, best_value)) if value <= best_value => (),
                _ => best = Some((coords.clone(), value)),
            }

            // Next combination of free coordinates
            let mut advanced = false;
            for axis in &free {
                if coords[*axis] + 1 < extents[*axis] {
                    coords[*axis] += 1;
                    advanced = true;
                    break;
                }

                coords[*axis] = 0;
            }

            if !advanced {
                break;
            }
        }

        best
    }
}

/// Entry maps for every predecessor of `state_ix` with a usable table
pub(crate) fn predecessor_entries<'t, S>(
    lattice: &Lattice,
    state_ix: usize,
    tables: &'t [OnceLock<ScoreTable<S>>],
) -> Result<Vec<(EntryMap, &'t ScoreTable<S>)>, GlocalError>
where
    S: ScoreType
{
    let state = lattice.get(state_ix);
    let mut entries = Vec::with_capacity(state.direct_previous().len());

    for &pred in state.direct_previous() {
        let pred_table = tables[pred].get()
            .ok_or(GlocalError::GraphError)?;

        if pred_table.is_void() {
            continue;
        }

        entries.push((EntryMap::new(pred, lattice.get(pred), state), pred_table));
    }

    Ok(entries)
}

/// Compute the score table of a state. All its predecessors must be filled already.
pub(crate) fn fill_state<S>(
    ctx: &FillContext<S>,
    state_ix: usize,
    tables: &[OnceLock<ScoreTable<S>>],
) -> Result<ScoreTable<S>, GlocalError>
where
    S: ScoreType
{
    let state = ctx.lattice.get(state_ix);
    if state.is_void() {
        debug!(state = state_ix, "{state}: void table");
        return Ok(ScoreTable::void());
    }

    let extents = ctx.extents(state);
    let mut table = ScoreTable::new(&extents)?;
    let entries = predecessor_entries(ctx.lattice, state_ix, tables)?;

    let mut column = Vec::with_capacity(extents.len());
    for c in sweep(&extents) {
        let mut value = if c.is_zero() { S::zero() } else { S::neg_infinity() };

        for pattern in MovePatterns::new(c.positive_axes()) {
            let Some(prev) = c.step_back(pattern) else {
                continue;
            };

            let candidate = table.get(&prev) + ctx.move_score(state, &c, pattern, &mut column);
            value = value.max(candidate);
        }

        for (entry, pred_table) in &entries {
            if let Some((_, candidate)) = entry.best_entry(pred_table, &c) {
                value = value.max(candidate);
            }
        }

        table.set(&c, value);
    }

    debug!(state = state_ix, axes = table.num_axes(), cells = table.num_cells(), predecessors = entries.len(), "{state}: filled");

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::scoring::Scoring;

    fn fill_all(sequences: &[Sequence]) -> (Lattice, Vec<OnceLock<ScoreTable<f32>>>) {
        let lattice = Lattice::from_sequences(sequences);
        let scorer = ColumnScorer::new(&Scoring::default());
        let ctx = FillContext { sequences, lattice: &lattice, scorer: &scorer };

        let tables: Vec<_> = (0..lattice.len()).map(|_| OnceLock::new()).collect();
        for ix in lattice.topological_order().unwrap() {
            let table = fill_state(&ctx, ix, &tables).unwrap();
            assert!(tables[ix].set(table).is_ok());
        }

        (lattice, tables)
    }

    #[test]
    fn test_needleman_wunsch_table() {
        let seqs = vec![Sequence::global("a", "ACGT"), Sequence::global("b", "AGT")];
        let (_, tables) = fill_all(&seqs);

        let table = tables[0].get().unwrap();
        assert_eq!(table.extents(), &[5, 4]);
        assert_eq!(table.get(&[0, 0]), 0.0);
        assert_eq!(table.get(&[2, 0]), -18.0);
        assert_eq!(table.get(&[0, 3]), -27.0);
        assert_eq!(table.get(&[1, 1]), 4.0);
        assert_eq!(table.get(&table.corner()), 3.0);
    }

    #[test]
    fn test_axis_edge_shortcut() {
        let seqs = vec![
            Sequence::global("a", "AC"),
            Sequence::global("b", "A"),
            Sequence::global("c", "A"),
        ];
        let (_, tables) = fill_all(&seqs);
        let table = tables[0].get().unwrap();

        // One advancing symbol against two gaps per step
        assert_eq!(table.get(&[2, 0, 0]), -36.0);
        assert_eq!(table.get(&[1, 1, 1]), 12.0);
    }

    #[test]
    fn test_free_flanks_for_local_sequence() {
        let seqs = vec![Sequence::global("a", "AAACGTAAA"), Sequence::local("b", "CGT")];
        let (lattice, tables) = fill_all(&seqs);

        // Only `a` active, nothing to score against
        let initial = tables[0].get().unwrap();
        assert_eq!(initial.get(&initial.corner()), 0.0);

        // Entering after any prefix of `a` is free
        let both = tables[1].get().unwrap();
        assert_eq!(both.get(&[3, 0]), 0.0);
        assert_eq!(both.get(&[6, 3]), 12.0);

        let last = tables[2].get().unwrap();
        assert!(lattice.get(2).is_final());
        assert_eq!(last.get(&last.corner()), 12.0);
    }

    #[test]
    fn test_void_state() {
        let seqs = vec![Sequence::local("a", "AC"), Sequence::local("b", "AC")];
        let (lattice, tables) = fill_all(&seqs);

        for (ix, state) in lattice.states().iter().enumerate() {
            assert_eq!(tables[ix].get().unwrap().is_void(), state.is_void());
        }
    }
}
