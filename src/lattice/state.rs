use std::fmt::{Display, Formatter};

use serde::Serialize;
use smallvec::SmallVec;

pub type IndexSet = SmallVec<[usize; 8]>;

/// Position of a sequence in its alignment life cycle. A sequence only ever moves forward:
/// `Ready` (not yet started), `Active` (being aligned), `Done` (finished).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Status {
    Ready,
    Active,
    Done,
}

/// One phase of the alignment: which sequences have not started yet, which are
/// being aligned, and which already finished.
#[derive(Clone, Debug, Serialize)]
pub struct LatticeState {
    pub(crate) ready: IndexSet,
    pub(crate) active: IndexSet,
    pub(crate) done: IndexSet,

    pub(crate) is_initial: bool,
    pub(crate) is_final: bool,

    pub(crate) previous: Vec<usize>,
    pub(crate) following: Vec<usize>,
    pub(crate) direct_previous: Vec<usize>,
    pub(crate) direct_following: Vec<usize>,
}

impl LatticeState {
    pub fn from_statuses(statuses: &[Status]) -> Self {
        let mut state = Self {
            ready: IndexSet::new(),
            active: IndexSet::new(),
            done: IndexSet::new(),
            is_initial: false,
            is_final: false,
            previous: Vec::new(),
            following: Vec::new(),
            direct_previous: Vec::new(),
            direct_following: Vec::new(),
        };

        for (i, status) in statuses.iter().enumerate() {
            match status {
                Status::Ready => state.ready.push(i),
                Status::Active => state.active.push(i),
                Status::Done => state.done.push(i),
            }
        }

        state
    }

    pub fn num_sequences(&self) -> usize {
        self.ready.len() + self.active.len() + self.done.len()
    }

    pub fn ready(&self) -> &[usize] {
        &self.ready
    }

    pub fn active(&self) -> &[usize] {
        &self.active
    }

    pub fn done(&self) -> &[usize] {
        &self.done
    }

    pub fn is_initial(&self) -> bool {
        self.is_initial
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// States from which this state can be reached
    pub fn previous(&self) -> &[usize] {
        &self.previous
    }

    /// States reachable from this state
    pub fn following(&self) -> &[usize] {
        &self.following
    }

    pub fn direct_previous(&self) -> &[usize] {
        &self.direct_previous
    }

    pub fn direct_following(&self) -> &[usize] {
        &self.direct_following
    }

    /// A state without active sequences has nothing to align and owns a void table
    pub fn is_void(&self) -> bool {
        self.active.is_empty()
    }

    pub fn status(&self, seq: usize) -> Status {
        if self.active.binary_search(&seq).is_ok() {
            Status::Active
        } else if self.done.binary_search(&seq).is_ok() {
            Status::Done
        } else {
            Status::Ready
        }
    }

    pub fn statuses(&self) -> Vec<Status> {
        (0..self.num_sequences())
            .map(|i| self.status(i))
            .collect()
    }

    /// Table axis of the given sequence, if it is active
    pub fn axis_of(&self, seq: usize) -> Option<usize> {
        self.active.binary_search(&seq).ok()
    }

    /// True if `next` can follow this state: it is another state and no sequence moves
    /// back in its life cycle.
    pub fn can_precede(&self, next: &LatticeState) -> bool {
        let mut differs = false;
        for i in 0..self.num_sequences() {
            let (a, b) = (self.status(i), next.status(i));
            if a > b {
                return false;
            }

            differs |= a != b;
        }

        differs
    }

    /// True if `next` follows this state by activating or finishing exactly one sequence
    pub fn directly_precedes(&self, next: &LatticeState) -> bool {
        let mut steps = 0;
        for i in 0..self.num_sequences() {
            let (a, b) = (self.status(i) as usize, next.status(i) as usize);
            if a > b {
                return false;
            }

            steps += b - a;
        }

        steps == 1
    }

    /// Node label `ready_active_done`, e.g. `2_01_`
    pub fn label(&self) -> String {
        let join = |set: &[usize]| set.iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");

        format!("{}_{}_{}", join(&self.ready), join(&self.active), join(&self.done))
    }
}

impl Display for LatticeState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{:?} A{:?} D{:?}", self.ready.as_slice(), self.active.as_slice(), self.done.as_slice())?;

        if self.is_initial {
            write!(f, " (initial)")?;
        }

        if self.is_final {
            write!(f, " (final)")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Status::*;

    #[test]
    fn test_partition_from_statuses() {
        let state = LatticeState::from_statuses(&[Active, Ready, Done, Active]);
        assert_eq!(state.ready(), &[1]);
        assert_eq!(state.active(), &[0, 3]);
        assert_eq!(state.done(), &[2]);
        assert_eq!(state.axis_of(3), Some(1));
        assert_eq!(state.axis_of(1), None);
        assert_eq!(state.label(), "1_0,3_2");
    }

    #[test]
    fn test_edge_legality() {
        let a = LatticeState::from_statuses(&[Ready, Active]);
        let b = LatticeState::from_statuses(&[Active, Active]);
        let c = LatticeState::from_statuses(&[Done, Active]);
        let d = LatticeState::from_statuses(&[Active, Done]);

        assert!(a.can_precede(&b));
        assert!(a.directly_precedes(&b));
        assert!(a.can_precede(&c));
        assert!(!a.directly_precedes(&c));
        assert!(!b.can_precede(&a));
        assert!(!a.can_precede(&a));
        assert!(!c.can_precede(&d));
        assert!(!d.can_precede(&c));
        assert!(b.directly_precedes(&d));
    }
}
