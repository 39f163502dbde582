//! Header-anchored field reading
//!
//! Templates place labels ("工厂名称：") or column headers ("符合等级") at
//! arbitrary positions; values sit at a fixed offset from them. An [`Anchor`]
//! records where a marker was found and reads cells relative to it.

use crate::workbook::{Cell, EMPTY_CELL, WorksheetGrid};

/// Position of a marker cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub row: usize,
    pub col: usize,
}

impl Anchor {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Read the cell `row_offset` rows down and `col_offset` columns across.
    ///
    /// Offsets that land before the first row or column read as blank.
    pub fn offset<'a>(&self, grid: &'a WorksheetGrid, row_offset: isize, col_offset: isize) -> &'a Cell {
        match (shift(self.row, row_offset), shift(self.col, col_offset)) {
            (Some(row), Some(col)) => grid.cell(row, col),
            _ => &EMPTY_CELL,
        }
    }

    /// Cell on the anchor row, `col_offset` columns across
    pub fn beside<'a>(&self, grid: &'a WorksheetGrid, col_offset: isize) -> &'a Cell {
        self.offset(grid, 0, col_offset)
    }
}

fn shift(base: usize, by: isize) -> Option<usize> {
    base.checked_add_signed(by)
}

/// True when the cell's text equals the marker exactly or after trimming
pub fn matches_marker(cell: &Cell, marker: &str) -> bool {
    if cell.is_empty() {
        return false;
    }
    let text = cell.display_text();
    text == marker || text.trim() == marker.trim()
}

/// Find the first cell equal to `marker`, scanning rows top to bottom and
/// cells left to right
pub fn locate(grid: &WorksheetGrid, marker: &str) -> Option<Anchor> {
    grid.rows().iter().enumerate().find_map(|(r, row)| {
        row.iter()
            .position(|cell| matches_marker(cell, marker))
            .map(|c| Anchor::new(r, c))
    })
}

/// Read the value `col_offset` columns right of a label.
///
/// A missing label is logged and yields a blank cell so extraction can go on.
pub fn read_labeled<'a>(grid: &'a WorksheetGrid, marker: &str, col_offset: isize) -> &'a Cell {
    match locate(grid, marker) {
        Some(anchor) => anchor.beside(grid, col_offset),
        None => {
            log::debug!("Marker '{}' not found, field left empty", marker);
            &EMPTY_CELL
        }
    }
}

/// Trimmed display text of a labeled value
pub fn read_labeled_text(grid: &WorksheetGrid, marker: &str, col_offset: isize) -> String {
    read_labeled(grid, marker, col_offset).display_text().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> WorksheetGrid {
        WorksheetGrid::from_strs(&[
            &["", "", ""],
            &["", " 工厂名称： ", "", "甲公司"],
            &["审核员：", "", "张三"],
        ])
    }

    #[test]
    fn test_locate_first_match() {
        assert_eq!(locate(&grid(), "工厂名称："), Some(Anchor::new(1, 1)));
        assert_eq!(locate(&grid(), "审核员："), Some(Anchor::new(2, 0)));
    }

    #[test]
    fn test_locate_missing_marker() {
        assert_eq!(locate(&grid(), "审核日期："), None);
        assert_eq!(locate(&WorksheetGrid::default(), "工厂名称："), None);
    }

    #[test]
    fn test_read_labeled_at_offset() {
        assert_eq!(read_labeled_text(&grid(), "工厂名称：", 2), "甲公司");
        assert_eq!(read_labeled_text(&grid(), "审核员：", 2), "张三");
        assert_eq!(read_labeled_text(&grid(), "审核日期：", 2), "");
    }

    #[test]
    fn test_numeric_markers_compare_by_display_text() {
        let grid = WorksheetGrid::new(vec![vec![Cell::Number(1.0), Cell::text("x")]]);
        assert_eq!(locate(&grid, "1"), Some(Anchor::new(0, 0)));
    }

    #[test]
    fn test_offset_outside_grid_is_blank() {
        let grid = grid();
        let anchor = Anchor::new(1, 1);
        assert_eq!(anchor.offset(&grid, -5, 0), &Cell::Empty);
        assert_eq!(anchor.beside(&grid, -2), &Cell::Empty);
        assert_eq!(anchor.beside(&grid, 40), &Cell::Empty);
        assert_eq!(anchor.offset(&grid, 1, 1), &Cell::text("张三"));
    }
}
