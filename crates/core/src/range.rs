use serde::{Deserialize, Serialize};

/// A cell of the rendered table. `row` indexes the filtered, sorted row set
/// (so it survives paging), `col` indexes the header sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A rectangular range of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl Range {
    /// Bounding box of two corners, in either order.
    pub fn spanning(a: CellRef, b: CellRef) -> Self {
        Self {
            start_row: a.row.min(b.row),
            start_col: a.col.min(b.col),
            end_row: a.row.max(b.row),
            end_col: a.col.max(b.col),
        }
    }

    pub fn single(cell: CellRef) -> Self {
        Self::spanning(cell, cell)
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start_row..=self.end_row).contains(&cell.row)
            && (self.start_col..=self.end_col).contains(&cell.col)
    }

    pub fn cell_count(&self) -> usize {
        (self.end_row - self.start_row + 1) * (self.end_col - self.start_col + 1)
    }

    /// All cells, row-major.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> {
        let Range { start_row, start_col, end_row, end_col } = *self;
        (start_row..=end_row)
            .flat_map(move |r| (start_col..=end_col).map(move |c| CellRef::new(r, c)))
    }
}
