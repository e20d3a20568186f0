//! The lattice of alignment phases implied by the boundary conditions of a set of sequences.
//!
//! A sequence that is local at its left end does not have to take part in the alignment
//! from its first symbol on; in terms of phases, it starts out `Ready` and gets activated
//! somewhere later. Likewise, a sequence that is local at its right end may finish before
//! the alignment ends. Every combination of statuses reachable this way is a state, and
//! states are connected whenever one can follow the other.

pub mod state;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use crate::errors::GlocalError;
use crate::sequence::Sequence;

pub use state::{IndexSet, LatticeState, Status};

#[derive(Clone, Debug, Serialize)]
pub struct Lattice {
    num_sequences: usize,
    states: Vec<LatticeState>,
}

impl Lattice {
    pub fn from_sequences(sequences: &[Sequence]) -> Self {
        LatticeBuilder::new(sequences).build()
    }

    pub fn num_sequences(&self) -> usize {
        self.num_sequences
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[LatticeState] {
        &self.states
    }

    pub fn get(&self, ix: usize) -> &LatticeState {
        &self.states[ix]
    }

    /// Index of the initial state
    pub fn initial(&self) -> usize {
        0
    }

    pub fn finals(&self) -> impl Iterator<Item=usize> + '_ {
        self.states.iter()
            .enumerate()
            .filter(|(_, s)| s.is_final())
            .map(|(ix, _)| ix)
    }

    /// Graph of the direct relations, one node per state with the state index as weight
    pub fn to_graph(&self) -> DiGraph<usize, ()> {
        self.build_graph(|s| s.direct_following())
    }

    /// Graph of all (transitive) relations
    pub fn to_transitive_graph(&self) -> DiGraph<usize, ()> {
        self.build_graph(|s| s.following())
    }

    fn build_graph<'a, F>(&'a self, edges_of: F) -> DiGraph<usize, ()>
    where
        F: Fn(&'a LatticeState) -> &'a [usize]
    {
        let mut graph = DiGraph::with_capacity(self.states.len(), 0);
        for ix in 0..self.states.len() {
            graph.add_node(ix);
        }

        for (ix, state) in self.states.iter().enumerate() {
            for next in edges_of(state) {
                graph.add_edge(NodeIndex::new(ix), NodeIndex::new(*next), ());
            }
        }

        graph
    }

    /// State indices in an order where each state comes after all its predecessors
    pub fn topological_order(&self) -> Result<Vec<usize>, GlocalError> {
        let graph = self.to_graph();
        let order = toposort(&graph, None)?;

        Ok(order.into_iter().map(|n| graph[n]).collect())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Operator {
    Activate,
    Finish,
}

/// Builds the lattice as the closure of the initial state under the activate and finish
/// operators.
pub struct LatticeBuilder<'a> {
    sequences: &'a [Sequence],
    states: Vec<LatticeState>,
    known: FxHashMap<Vec<Status>, usize>,
}

impl<'a> LatticeBuilder<'a> {
    pub fn new(sequences: &'a [Sequence]) -> Self {
        Self {
            sequences,
            states: Vec::new(),
            known: FxHashMap::default(),
        }
    }

    pub fn build(mut self) -> Lattice {
        let initial: Vec<Status> = self.sequences.iter()
            .map(|s| if s.is_global_left() { Status::Active } else { Status::Ready })
            .collect();

        let initial_ix = self.insert(initial);
        self.states[initial_ix].is_initial = true;

        let any_fully_local = self.sequences.iter().any(|s| s.is_fully_local());
        let (first, second) = if any_fully_local {
            (Operator::Activate, Operator::Finish)
        } else {
            (Operator::Finish, Operator::Activate)
        };

        self.closure(vec![initial_ix], first);
        let all_states = (0..self.states.len()).collect();
        self.closure(all_states, second);

        self.mark_final();

        debug!("Built lattice with {} states for {} sequences.", self.states.len(), self.sequences.len());

        Lattice {
            num_sequences: self.sequences.len(),
            states: self.states,
        }
    }

    fn insert(&mut self, statuses: Vec<Status>) -> usize {
        let ix = self.states.len();
        self.states.push(LatticeState::from_statuses(&statuses));
        self.known.insert(statuses, ix);

        ix
    }

    fn applicable(&self, op: Operator, seq: usize, status: Status) -> bool {
        match op {
            Operator::Activate => status == Status::Ready && !self.sequences[seq].is_global_left(),
            Operator::Finish => status == Status::Active && !self.sequences[seq].is_global_right(),
        }
    }

    fn closure(&mut self, seeds: Vec<usize>, op: Operator) {
        let mut frontier = seeds;

        while !frontier.is_empty() {
            let mut new_states = Vec::new();

            for ix in frontier {
                let statuses = self.states[ix].statuses();

                for (seq, status) in statuses.iter().enumerate() {
                    if !self.applicable(op, seq, *status) {
                        continue;
                    }

                    let mut next = statuses.clone();
                    next[seq] = match op {
                        Operator::Activate => Status::Active,
                        Operator::Finish => Status::Done,
                    };

                    if !self.known.contains_key(&next) {
                        new_states.push(self.insert(next));
                    }
                }
            }

            self.connect(&new_states);
            frontier = new_states;
        }
    }

    /// Relate every new state to every other state, old or new, in both directions
    fn connect(&mut self, new_states: &[usize]) {
        for &new in new_states {
            for other in 0..self.states.len() {
                if other == new {
                    continue;
                }

                self.relate(other, new);
                self.relate(new, other);
            }
        }
    }

    fn relate(&mut self, from: usize, to: usize) {
        if !self.states[from].can_precede(&self.states[to]) {
            return;
        }

        let direct = self.states[from].directly_precedes(&self.states[to]);

        insert_sorted(&mut self.states[from].following, to);
        insert_sorted(&mut self.states[to].previous, from);

        if direct {
            insert_sorted(&mut self.states[from].direct_following, to);
            insert_sorted(&mut self.states[to].direct_previous, from);
        }
    }

    fn mark_final(&mut self) {
        let global_right: Vec<usize> = self.sequences.iter()
            .enumerate()
            .filter(|(_, s)| s.is_global_right())
            .map(|(ix, _)| ix)
            .collect();

        for state in self.states.iter_mut() {
            state.is_final = global_right.is_empty()
                || (state.ready.is_empty() && state.active.as_slice() == global_right.as_slice());
        }
    }
}

fn insert_sorted(set: &mut Vec<usize>, value: usize) {
    if let Err(pos) = set.binary_search(&value) {
        set.insert(pos, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_lattice_invariants(lattice: &Lattice) {
        let n = lattice.num_sequences();

        for state in lattice.states() {
            let mut all: Vec<usize> = state.ready().iter()
                .chain(state.active())
                .chain(state.done())
                .copied()
                .collect();

            for set in [state.ready(), state.active(), state.done()] {
                assert!(set.windows(2).all(|w| w[0] < w[1]));
            }

            all.sort();
            assert_eq!(all, (0..n).collect::<Vec<_>>());
        }

        assert_eq!(lattice.states().iter().filter(|s| s.is_initial()).count(), 1);
        assert!(lattice.get(lattice.initial()).is_initial());
        assert!(lattice.topological_order().is_ok());

        for (ix, state) in lattice.states().iter().enumerate() {
            for prev in state.direct_previous() {
                assert!(state.previous().contains(prev));
                assert!(lattice.get(*prev).direct_following().contains(&ix));
            }
        }
    }

    #[test]
    fn test_all_global() {
        let seqs = vec![Sequence::global("a", "ACGT"), Sequence::global("b", "AGT")];
        let lattice = Lattice::from_sequences(&seqs);

        check_lattice_invariants(&lattice);
        assert_eq!(lattice.len(), 1);

        let state = lattice.get(0);
        assert!(state.is_initial() && state.is_final());
        assert_eq!(state.active(), &[0, 1]);
    }

    #[test]
    fn test_global_and_fully_local() {
        let seqs = vec![Sequence::global("a", "AAACGTAAA"), Sequence::local("b", "CGT")];
        let lattice = Lattice::from_sequences(&seqs);

        check_lattice_invariants(&lattice);
        assert_eq!(lattice.len(), 3);

        let labels: Vec<_> = lattice.states().iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["1_0_", "_0,1_", "_0_1"]);

        // The local sequence has to be activated at some point
        let finals: Vec<_> = lattice.finals().collect();
        assert_eq!(finals, vec![2]);

        assert_eq!(lattice.get(1).direct_previous(), &[0]);
        assert_eq!(lattice.get(2).direct_previous(), &[1]);
        assert_eq!(lattice.get(2).previous(), &[0, 1]);
        assert_eq!(lattice.topological_order().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_semi_global_ends() {
        // Local left end only, and local right end only
        let seqs = vec![
            Sequence::new("a", "ACGT", false, true),
            Sequence::new("b", "ACGT", true, false),
        ];
        let lattice = Lattice::from_sequences(&seqs);

        check_lattice_invariants(&lattice);

        // Initial R{0} A{1}, then finish 1 or activate 0, and both
        assert_eq!(lattice.len(), 4);
        let finals: Vec<_> = lattice.finals()
            .map(|ix| lattice.get(ix).label())
            .collect();
        assert_eq!(finals, vec!["_0_1"]);
    }

    #[test]
    fn test_all_local_every_state_final() {
        let seqs = vec![Sequence::local("a", "AC"), Sequence::local("b", "CG")];
        let lattice = Lattice::from_sequences(&seqs);

        check_lattice_invariants(&lattice);

        // Every combination of statuses is reachable
        assert_eq!(lattice.len(), 9);
        assert_eq!(lattice.finals().count(), 9);
    }

    #[test]
    fn test_no_sequences() {
        let lattice = Lattice::from_sequences(&[]);

        assert_eq!(lattice.len(), 1);
        let state = lattice.get(0);
        assert!(state.is_initial() && state.is_final() && state.is_void());
    }
}
