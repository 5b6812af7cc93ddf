//! Spreadsheet-style cell selection.
//!
//! A small state machine driven by abstract pointer events, so any surface
//! (terminal, GUI, test) can feed it:
//!
//! ```text
//!   Idle --press--> Dragging --move--> Dragging --release--> Idle (copy)
//!   Idle/Toggled --modifier press--> Toggled (copy)
//! ```
//!
//! Selected cells carry their text, captured when they were picked, and are
//! kept in row-major order so serialization is a straight walk.

use std::collections::BTreeMap;

use crate::range::{CellRef, Range};

/// Anything that can hand out the display text of a cell.
pub trait CellGrid {
    /// `None` when the cell is outside the grid.
    fn cell_text(&self, cell: CellRef) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false, meta: false, shift: false };

    pub fn ctrl() -> Self {
        Modifiers { ctrl: true, ..Self::NONE }
    }

    /// Ctrl (or Cmd) turns a press into a single-cell toggle.
    pub fn toggles(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionMode {
    #[default]
    Idle,
    Dragging { anchor: CellRef },
    Toggled,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    mode: SelectionMode,
    cells: BTreeMap<CellRef, String>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        self.cells.contains_key(&cell)
    }

    /// Selected cells, row-major.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        self.cells.keys().copied()
    }

    /// Forget everything and go back to idle.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.mode = SelectionMode::Idle;
    }

    /// Button press on a cell. Returns text to copy when the press itself
    /// completes a selection (modifier toggle) and something is still selected.
    pub fn pointer_down(
        &mut self,
        cell: CellRef,
        button: PointerButton,
        modifiers: Modifiers,
        grid: &dyn CellGrid,
    ) -> Option<String> {
        if button != PointerButton::Primary {
            return None;
        }

        if modifiers.toggles() {
            if self.cells.remove(&cell).is_none() {
                if let Some(text) = grid.cell_text(cell) {
                    self.cells.insert(cell, text);
                }
            }
            if self.cells.is_empty() {
                self.mode = SelectionMode::Idle;
                return None;
            }
            self.mode = SelectionMode::Toggled;
            return Some(self.serialize());
        }

        self.cells.clear();
        self.mode = SelectionMode::Dragging { anchor: cell };
        self.select_range(Range::single(cell), grid);
        None
    }

    /// Pointer moved over a cell. Only matters while dragging.
    pub fn pointer_move(&mut self, cell: CellRef, grid: &dyn CellGrid) {
        if let SelectionMode::Dragging { anchor } = self.mode {
            self.cells.clear();
            self.select_range(Range::spanning(anchor, cell), grid);
        }
    }

    /// Button released anywhere. Ends a drag and returns the text to copy.
    pub fn pointer_up(&mut self) -> Option<String> {
        if !matches!(self.mode, SelectionMode::Dragging { .. }) {
            return None;
        }
        self.mode = SelectionMode::Idle;
        if self.cells.is_empty() {
            None
        } else {
            Some(self.serialize())
        }
    }

    fn select_range(&mut self, range: Range, grid: &dyn CellGrid) {
        for cell in range.cells() {
            if let Some(text) = grid.cell_text(cell) {
                self.cells.insert(cell, text);
            }
        }
    }

    /// Tab between cells of a row, newline between rows, rows and columns ascending.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        let mut current_row = None;
        for (cell, text) in &self.cells {
            match current_row {
                None => {}
                Some(row) if row == cell.row => out.push('\t'),
                Some(_) => out.push('\n'),
            }
            current_row = Some(cell.row);
            out.push_str(text);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Grid(Vec<Vec<&'static str>>);

    impl CellGrid for Grid {
        fn cell_text(&self, cell: CellRef) -> Option<String> {
            self.0.get(cell.row)?.get(cell.col).map(|s| s.to_string())
        }
    }

    fn grid() -> Grid {
        Grid(vec![vec!["A", "B", "x"], vec!["C", "D", "y"], vec!["E", "F", "z"]])
    }

    fn at(row: usize, col: usize) -> CellRef {
        CellRef::new(row, col)
    }

    #[test]
    fn drag_rectangle_serializes_row_major() {
        let g = grid();
        let mut sel = SelectionModel::new();
        assert_eq!(sel.pointer_down(at(1, 1), PointerButton::Primary, Modifiers::NONE, &g), None);
        sel.pointer_move(at(0, 0), &g);
        assert_eq!(sel.mode(), SelectionMode::Dragging { anchor: at(1, 1) });
        assert_eq!(sel.pointer_up().as_deref(), Some("A\tB\nC\tD"));
        assert_eq!(sel.mode(), SelectionMode::Idle);
        assert_eq!(sel.len(), 4);
    }

    #[test]
    fn moving_back_shrinks_rectangle() {
        let g = grid();
        let mut sel = SelectionModel::new();
        sel.pointer_down(at(0, 0), PointerButton::Primary, Modifiers::NONE, &g);
        sel.pointer_move(at(2, 2), &g);
        sel.pointer_move(at(0, 1), &g);
        assert_eq!(sel.pointer_up().as_deref(), Some("A\tB"));
    }

    #[test]
    fn plain_press_replaces_selection() {
        let g = grid();
        let mut sel = SelectionModel::new();
        sel.pointer_down(at(0, 0), PointerButton::Primary, Modifiers::ctrl(), &g);
        sel.pointer_down(at(2, 2), PointerButton::Primary, Modifiers::NONE, &g);
        assert_eq!(sel.cells().collect::<Vec<_>>(), vec![at(2, 2)]);
    }

    fn toggle(sel: &mut SelectionModel, cell: CellRef, modifiers: Modifiers) -> Option<String> {
        sel.pointer_down(cell, PointerButton::Primary, modifiers, &grid())
    }

    #[test]
    fn modifier_toggles_cells_and_copies() {
        let mut sel = SelectionModel::new();
        let ctrl = Modifiers::ctrl();
        assert_eq!(toggle(&mut sel, at(2, 0), ctrl).as_deref(), Some("E"));
        assert_eq!(toggle(&mut sel, at(0, 2), ctrl).as_deref(), Some("x\nE"));
        assert_eq!(toggle(&mut sel, at(0, 1), ctrl).as_deref(), Some("B\tx\nE"));
        assert_eq!(sel.mode(), SelectionMode::Toggled);
        // Toggle off
        assert_eq!(toggle(&mut sel, at(2, 0), ctrl).as_deref(), Some("B\tx"));
        // Release after toggling copies nothing extra
        assert_eq!(sel.pointer_up(), None);
    }

    #[test]
    fn toggling_last_cell_off_goes_idle() {
        let mut sel = SelectionModel::new();
        let meta = Modifiers { meta: true, ..Modifiers::NONE };
        assert_eq!(toggle(&mut sel, at(1, 1), meta).as_deref(), Some("D"));
        // Nothing left to copy, so the clipboard is left alone
        assert_eq!(toggle(&mut sel, at(1, 1), meta), None);
        assert!(sel.is_empty());
        assert_eq!(sel.mode(), SelectionMode::Idle);
    }

    #[test]
    fn toggle_outside_grid_with_nothing_selected_copies_nothing() {
        let mut sel = SelectionModel::new();
        assert_eq!(toggle(&mut sel, at(7, 7), Modifiers::ctrl()), None);
        assert_eq!(sel.mode(), SelectionMode::Idle);
    }

    #[test]
    fn non_primary_buttons_are_ignored() {
        let g = grid();
        let mut sel = SelectionModel::new();
        assert_eq!(sel.pointer_down(at(0, 0), PointerButton::Secondary, Modifiers::NONE, &g), None);
        assert_eq!(sel.mode(), SelectionMode::Idle);
        assert!(sel.is_empty());
    }

    #[test]
    fn cells_outside_grid_are_skipped() {
        let g = grid();
        let mut sel = SelectionModel::new();
        sel.pointer_down(at(2, 2), PointerButton::Primary, Modifiers::NONE, &g);
        sel.pointer_move(at(3, 3), &g);
        assert_eq!(sel.pointer_up().as_deref(), Some("z"));
    }

    #[test]
    fn move_without_drag_does_nothing() {
        let g = grid();
        let mut sel = SelectionModel::new();
        sel.pointer_move(at(1, 1), &g);
        assert!(sel.is_empty());
        sel.clear();
        assert_eq!(sel.serialize(), "");
    }
}
