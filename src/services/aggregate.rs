//! Streaming aggregation of cumulative directory sizes
//!
//! Only directories on the currently open ancestor chain are tracked. A
//! directory is opened when the walk enters it, receives the size of each
//! child as that child completes, and is removed when it finalizes, so the
//! table never holds more than one entry per level of the tree.

use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct DirectoryAggregator {
    open: Vec<(PathBuf, u64)>,
    peak: usize,
}

impl DirectoryAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a zero total for a directory being entered.
    pub fn open(&mut self, dir: &Path) {
        if self.position(dir).is_none() {
            self.push(dir.to_path_buf(), 0);
        }
    }

    /// Fold a completed child's size into its parent's running total.
    pub fn record_child_size(&mut self, parent: &Path, size: u64) {
        match self.position(parent) {
            Some(idx) => {
                let total = &mut self.open[idx].1;
                *total = total.saturating_add(size);
            }
            None => self.push(parent.to_path_buf(), size),
        }
    }

    /// Return the accumulated size of `dir` and stop tracking it.
    ///
    /// A directory that never received a child size is empty and reports zero.
    pub fn finalize_and_size(&mut self, dir: &Path) -> u64 {
        match self.position(dir) {
            Some(idx) => self.open.remove(idx).1,
            None => 0,
        }
    }

    /// Number of directories currently tracked.
    #[must_use]
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    /// Largest number of directories tracked at once during this aggregator's life.
    #[must_use]
    pub fn peak_len(&self) -> usize {
        self.peak
    }

    fn push(&mut self, dir: PathBuf, size: u64) {
        self.open.push((dir, size));
        self.peak = self.peak.max(self.open.len());
    }

    // The active directory is almost always the innermost one, so search from the top.
    fn position(&self, dir: &Path) -> Option<usize> {
        self.open.iter().rposition(|(path, _)| path == dir)
    }
}
