use smallvec::SmallVec;

use crate::aligner::coords::CoordVector;
use crate::aligner::scoring::ScoreType;
use crate::errors::GlocalError;

/// Dense N-dimensional array of cell scores.
///
/// Each axis corresponds to an active sequence and has extent `len + 1`. Cells are
/// stored in mixed-radix order with axis 0 changing fastest. A table without axes is
/// void: it has no cells at all.
#[derive(Clone, Debug)]
pub struct ScoreTable<S> {
    extents: SmallVec<[usize; 8]>,
    strides: SmallVec<[usize; 8]>,
    cells: Vec<S>,
}

impl<S> ScoreTable<S>
where
    S: ScoreType
{
    /// Number of cells a table with the given extents requires, or `None` if it does not
    /// fit in `usize`.
    pub fn cell_count(extents: &[usize]) -> Option<usize> {
        if extents.is_empty() {
            return Some(0);
        }

        extents.iter()
            .try_fold(1usize, |acc, e| acc.checked_mul(*e))
    }

    /// Allocate a table with every cell set to negative infinity
    pub fn new(extents: &[usize]) -> Result<Self, GlocalError> {
        let num_cells = Self::cell_count(extents)
            .ok_or(GlocalError::ResourceExhausted { requested: None })?;

        let mut cells = Vec::new();
        cells.try_reserve_exact(num_cells)
            .map_err(|_| GlocalError::ResourceExhausted { requested: Some(num_cells) })?;
        cells.resize(num_cells, S::neg_infinity());

        let mut strides = SmallVec::with_capacity(extents.len());
        let mut stride = 1;
        for extent in extents {
            strides.push(stride);
            stride *= *extent;
        }

        Ok(Self {
            extents: SmallVec::from_slice(extents),
            strides,
            cells,
        })
    }

    pub fn void() -> Self {
        Self {
            extents: SmallVec::new(),
            strides: SmallVec::new(),
            cells: Vec::new(),
        }
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.extents.is_empty()
    }

    #[inline]
    pub fn num_axes(&self) -> usize {
        self.extents.len()
    }

    #[inline]
    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn flat_index(&self, coords: &[usize]) -> usize {
        debug_assert_eq!(coords.len(), self.extents.len());

        coords.iter()
            .zip(&self.strides)
            .map(|(c, s)| c * s)
            .sum()
    }

    pub fn coords_of(&self, mut flat: usize) -> CoordVector {
        self.extents.iter()
            .map(|extent| {
                let c = flat % extent;
                flat /= extent;
                c
            })
            .collect()
    }

    pub fn contains(&self, coords: &[usize]) -> bool {
        !self.is_void()
            && coords.len() == self.extents.len()
            && coords.iter().zip(&self.extents).all(|(c, e)| c < e)
    }

    #[inline]
    pub fn get(&self, coords: &[usize]) -> S {
        self.cells[self.flat_index(coords)]
    }

    pub fn try_get(&self, coords: &[usize]) -> Option<S> {
        if self.contains(coords) {
            Some(self.get(coords))
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, coords: &[usize], value: S) {
        let ix = self.flat_index(coords);
        self.cells[ix] = value;
    }

    /// The cell where every active sequence is fully consumed
    pub fn corner(&self) -> CoordVector {
        self.extents.iter().map(|e| e - 1).collect()
    }

    /// The highest scoring cell. Ties resolve to the first cell in storage order.
    pub fn max_cell(&self) -> Option<(CoordVector, S)> {
        let mut best: Option<(usize, S)> = None;
        for (ix, value) in self.cells.iter().enumerate() {
            match best {
                Some((_, best_value)) if *value <= best_value => (),
                _ => best = Some((ix, *value)),
            }
        }

        best.map(|(ix, value)| (self.coords_of(ix), value))
    }
}
