//! LayoutGrid — two-dimensional keyboard focus over a flat list of cards.
//!
//! Items are laid out row-major with `columns` cells per row; the last row
//! may be partial. Left/Right wrap across row boundaries, Up/Down stop at the
//! edges and clamp the column onto a shorter last row.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutGrid {
    item_count: usize,
    columns: usize,
    row: usize,
    column: usize,
}

impl LayoutGrid {
    pub fn new(item_count: usize, columns: usize) -> Self {
        Self {
            item_count,
            columns: columns.max(1),
            row: 0,
            column: 0,
        }
    }

    pub fn row_count(&self) -> usize {
        self.item_count.div_ceil(self.columns)
    }

    /// `(row, column)` of the focused cell.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.column)
    }

    /// Flat index of the focused item, `None` while the grid is empty.
    pub fn focused(&self) -> Option<usize> {
        (self.item_count > 0).then(|| self.row * self.columns + self.column)
    }

    /// Number of cells in `row`.
    fn row_len(&self, row: usize) -> usize {
        let start = row * self.columns;
        self.item_count.saturating_sub(start).min(self.columns)
    }

    /// Move focus onto item `index` (clamped to the last item).
    pub fn focus_index(&mut self, index: usize) {
        if self.item_count == 0 {
            self.row = 0;
            self.column = 0;
            return;
        }
        let index = index.min(self.item_count - 1);
        self.row = index / self.columns;
        self.column = index % self.columns;
    }

    /// Change the column count. A cursor that would point past the grid is
    /// pulled back into bounds.
    pub fn resize(&mut self, columns: usize) {
        let columns = columns.max(1);
        if columns == self.columns {
            return;
        }
        self.columns = columns;
        self.clamp();
    }

    pub fn set_item_count(&mut self, item_count: usize) {
        if item_count == self.item_count {
            return;
        }
        self.item_count = item_count;
        self.clamp();
    }

    fn clamp(&mut self) {
        if self.item_count == 0 {
            self.row = 0;
            self.column = 0;
            return;
        }
        self.column = self.column.min(self.columns - 1);
        self.row = self.row.min(self.row_count() - 1);
        self.column = self.column.min(self.row_len(self.row) - 1);
    }

    /// Apply a navigation key. Returns the newly focused index when the
    /// cursor moved; keys that do not navigate (or hit an edge) return `None`.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<usize> {
        if key.kind == KeyEventKind::Release || self.item_count == 0 {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let last_row = self.row_count() - 1;
        let (row, column) = (self.row, self.column);

        let target = match key.code {
            KeyCode::Left => {
                if column > 0 {
                    (row, column - 1)
                } else if row > 0 {
                    (row - 1, self.row_len(row - 1) - 1)
                } else {
                    return None;
                }
            }
            KeyCode::Right => {
                if column + 1 < self.row_len(row) {
                    (row, column + 1)
                } else if row < last_row {
                    (row + 1, 0)
                } else {
                    return None;
                }
            }
            KeyCode::Up if row > 0 => (row - 1, column.min(self.row_len(row - 1) - 1)),
            KeyCode::Down if row < last_row => (row + 1, column.min(self.row_len(row + 1) - 1)),
            KeyCode::Home if ctrl => (0, 0),
            KeyCode::End if ctrl => (last_row, self.row_len(last_row) - 1),
            KeyCode::Home => (row, 0),
            KeyCode::End => (row, self.row_len(row) - 1),
            _ => return None,
        };

        if target == (row, column) {
            return None;
        }
        (self.row, self.column) = target;
        self.focused()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    #[test]
    fn test_empty_grid_ignores_keys() {
        let mut grid = LayoutGrid::new(0, 4);
        assert_eq!(grid.focused(), None);
        assert_eq!(grid.handle_key(key(KeyCode::Right)), None);
        assert_eq!(grid.handle_key(ctrl(KeyCode::End)), None);
    }

    #[test]
    fn test_left_right_wrap_across_rows() {
        // 0 1 2
        // 3 4 5
        // 6
        let mut grid = LayoutGrid::new(7, 3);
        assert_eq!(grid.handle_key(key(KeyCode::Left)), None);
        assert_eq!(grid.handle_key(key(KeyCode::Right)), Some(1));
        assert_eq!(grid.handle_key(key(KeyCode::Right)), Some(2));
        assert_eq!(grid.handle_key(key(KeyCode::Right)), Some(3));
        assert_eq!(grid.cursor(), (1, 0));
        assert_eq!(grid.handle_key(key(KeyCode::Left)), Some(2));

        grid.focus_index(5);
        assert_eq!(grid.handle_key(key(KeyCode::Right)), Some(6));
        assert_eq!(grid.handle_key(key(KeyCode::Right)), None);
        assert_eq!(grid.cursor(), (2, 0));
    }

    #[test]
    fn test_down_onto_partial_row_clamps_column() {
        let mut grid = LayoutGrid::new(7, 3);
        grid.focus_index(5);
        assert_eq!(grid.cursor(), (1, 2));
        assert_eq!(grid.handle_key(key(KeyCode::Down)), Some(6));
        assert_eq!(grid.cursor(), (2, 0));
        assert_eq!(grid.handle_key(key(KeyCode::Down)), None);
        // Up keeps the clamped column.
        assert_eq!(grid.handle_key(key(KeyCode::Up)), Some(3));
    }

    #[test]
    fn test_up_down_stop_at_edges() {
        let mut grid = LayoutGrid::new(6, 3);
        grid.focus_index(1);
        assert_eq!(grid.handle_key(key(KeyCode::Up)), None);
        assert_eq!(grid.handle_key(key(KeyCode::Down)), Some(4));
        assert_eq!(grid.handle_key(key(KeyCode::Down)), None);
    }

    #[test]
    fn test_home_end_and_ctrl_variants() {
        let mut grid = LayoutGrid::new(8, 3);
        grid.focus_index(4);
        assert_eq!(grid.handle_key(key(KeyCode::End)), Some(5));
        assert_eq!(grid.handle_key(key(KeyCode::Home)), Some(3));
        assert_eq!(grid.handle_key(ctrl(KeyCode::End)), Some(7));
        assert_eq!(grid.cursor(), (2, 1));
        assert_eq!(grid.handle_key(key(KeyCode::End)), None);
        assert_eq!(grid.handle_key(ctrl(KeyCode::Home)), Some(0));
        assert_eq!(grid.handle_key(key(KeyCode::Home)), None);
    }

    #[test]
    fn test_single_column_behaves_like_a_list() {
        let mut grid = LayoutGrid::new(3, 1);
        assert_eq!(grid.handle_key(key(KeyCode::Right)), Some(1));
        assert_eq!(grid.handle_key(key(KeyCode::Down)), Some(2));
        assert_eq!(grid.handle_key(key(KeyCode::Down)), None);
        assert_eq!(grid.handle_key(key(KeyCode::Left)), Some(1));
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut grid = LayoutGrid::new(4, 2);
        let mut release = key(KeyCode::Right);
        release.kind = KeyEventKind::Release;
        assert_eq!(grid.handle_key(release), None);
        assert_eq!(grid.cursor(), (0, 0));
    }

    #[test]
    fn test_unrelated_keys_pass_through() {
        let mut grid = LayoutGrid::new(4, 2);
        assert_eq!(grid.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(grid.handle_key(key(KeyCode::Char('j'))), None);
    }

    #[test]
    fn test_resize_clamps_cursor_into_bounds() {
        let mut grid = LayoutGrid::new(10, 4);
        grid.focus_index(7);
        assert_eq!(grid.cursor(), (1, 3));

        grid.resize(2);
        assert_eq!(grid.cursor(), (1, 1));
        assert_eq!(grid.focused(), Some(3));

        // Row 4 does not exist with 6 columns; the column is kept.
        grid.focus_index(9);
        assert_eq!(grid.cursor(), (4, 1));
        grid.resize(6);
        assert_eq!(grid.cursor(), (1, 1));
        assert_eq!(grid.focused(), Some(7));

        grid.resize(0);
        assert_eq!(grid.cursor(), (1, 0));
        assert_eq!(grid.focused(), Some(1));
    }

    #[test]
    fn test_shrinking_item_count_clamps_cursor() {
        let mut grid = LayoutGrid::new(9, 3);
        grid.focus_index(8);
        grid.set_item_count(4);
        assert_eq!(grid.cursor(), (1, 0));
        assert_eq!(grid.focused(), Some(3));

        grid.set_item_count(0);
        assert_eq!(grid.focused(), None);
        assert_eq!(grid.cursor(), (0, 0));
    }
}
