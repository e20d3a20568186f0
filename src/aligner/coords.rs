//! Coordinates into a score table and the combinatorial generators used to sweep it.

use std::ops::{Deref, DerefMut};

use itertools::Itertools;
use smallvec::SmallVec;

/// Bit set over the axes of a score table, used for move patterns and the set of positive
/// coordinates of a cell.
pub type AxisMask = u64;

/// Number of axes a mask can describe.
pub const MAX_AXES: usize = AxisMask::BITS as usize - 1;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordVector(SmallVec<[usize; 8]>);

impl CoordVector {
    pub fn zeros(num_axes: usize) -> Self {
        Self(SmallVec::from_elem(0, num_axes))
    }

    pub fn from_slice(coords: &[usize]) -> Self {
        Self(SmallVec::from_slice(coords))
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|c| *c == 0)
    }

    /// Mask of the axes with a positive coordinate
    #[inline]
    pub fn positive_axes(&self) -> AxisMask {
        self.0.iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .fold(0, |mask, (axis, _)| mask | (1 << axis))
    }

    /// Step back by one along every axis in `pattern`. Returns `None` if this would
    /// make a coordinate negative.
    pub fn step_back(&self, pattern: AxisMask) -> Option<Self> {
        let mut prev = self.clone();
        for (axis, c) in prev.0.iter_mut().enumerate() {
            if pattern & (1 << axis) != 0 {
                *c = c.checked_sub(1)?;
            }
        }

        Some(prev)
    }

}

impl Deref for CoordVector {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CoordVector {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<usize> for CoordVector {
    fn from_iter<T: IntoIterator<Item=usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Iterates over all non-empty subsets of a mask, from the full mask down to the
/// single-axis patterns (in decreasing numeric order).
pub struct MovePatterns {
    mask: AxisMask,
    next: AxisMask,
}

impl MovePatterns {
    pub fn new(mask: AxisMask) -> Self {
        Self { mask, next: mask }
    }
}

impl Iterator for MovePatterns {
    type Item = AxisMask;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == 0 {
            return None;
        }

        let current = self.next;
        self.next = (current - 1) & self.mask;

        Some(current)
    }
}

/// Iterates over the cells of a table face: the cells whose positive coordinates are
/// exactly the given axes. Cells are visited with the first axis changing fastest, so
/// every cell comes after all cells of the same face it can be reached from.
pub struct FaceCells<'a> {
    extents: &'a [usize],
    axes: SmallVec<[usize; 8]>,
    current: Option<CoordVector>,
}

impl<'a> FaceCells<'a> {
    pub fn new(extents: &'a [usize], axes: &[usize]) -> Self {
        let mut start = CoordVector::zeros(extents.len());
        let mut empty = false;
        for axis in axes {
            if extents[*axis] < 2 {
                empty = true;
            }

            start[*axis] = 1;
        }

        Self {
            extents,
            axes: SmallVec::from_slice(axes),
            current: if empty { None } else { Some(start) },
        }
    }
}

impl Iterator for FaceCells<'_> {
    type Item = CoordVector;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;

        let mut next = current.clone();
        let mut advanced = false;
        for axis in &self.axes {
            if next[*axis] + 1 < self.extents[*axis] {
                next[*axis] += 1;
                advanced = true;
                break;
            }

            next[*axis] = 1;
        }

        if advanced {
            self.current = Some(next);
        }

        Some(current)
    }
}

/// All faces of a table with `num_axes` axes, by increasing dimension: the zero cell,
/// the axis edges, the faces of dimension 2 to `num_axes - 1`, and finally the interior.
pub fn faces(num_axes: usize) -> impl Iterator<Item=Vec<usize>> {
    (0..=num_axes)
        .flat_map(move |dim| (0..num_axes).combinations(dim))
}

/// Iterates over all cells of a table in sweep order.
pub fn sweep(extents: &[usize]) -> impl Iterator<Item=CoordVector> + '_ {
    faces(extents.len())
        .flat_map(move |axes| FaceCells::new(extents, &axes).collect::<Vec<_>>())
}
