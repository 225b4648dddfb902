use crate::canvas::{CellIndex, Grid};

// ============================================================================
// PIXEL PATH — chronological log of cell-affecting actions
// ============================================================================

/// Ordered record of which cell each paint or erase touched.
///
/// Entries don't say what the action was: [`Cell::undo_last`] works that out
/// from the cell's own state, so undoing is "pop the tail, undo that cell".
///
/// [`Cell::undo_last`]: crate::canvas::Cell::undo_last
#[derive(Clone, Debug, Default)]
pub struct PixelPath {
    entries: Vec<CellIndex>,
}

impl PixelPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<CellIndex>) -> Self {
        Self { entries }
    }

    pub fn record(&mut self, index: CellIndex) {
        self.entries.push(index);
    }

    /// Reverse the most recent action. Returns `false` on an empty log.
    pub fn undo(&mut self, grid: &mut Grid) -> bool {
        let Some(index) = self.entries.pop() else {
            return false;
        };

        let undone = grid.cell_mut(index).is_some_and(|cell| cell.undo_last());
        if !undone {
            debug_assert!(false, "history entry {:?} has nothing to undo", index);
            log_warn!(
                "Undo skipped: cell ({}, {}) has no action to reverse",
                index.row,
                index.column
            );
        }
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CellIndex] {
        &self.entries
    }
}
