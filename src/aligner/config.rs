/// Default upper bound on the total number of score table cells of one alignment
pub const DEFAULT_MAX_CELLS: usize = 1 << 31;

/// Runtime settings of the aligner that do not change its result
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AlignerConfig {
    /// Number of worker threads used to fill score tables. With 0 or 1, tables are filled
    /// on the calling thread.
    pub threads: usize,

    /// Upper bound on the number of cells over all score tables
    pub max_cells: usize,
}

impl AlignerConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}
