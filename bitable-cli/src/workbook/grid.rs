//! In-memory worksheet representation
//!
//! A parsed workbook is an ordered list of sheets, each a 2D grid of cells
//! anchored at A1. Grids are immutable once built.

use chrono::NaiveDateTime;
use std::cmp::Ordering;

/// A single worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Blank cell (also used for error cells and padding)
    Empty,
    /// Text content, kept verbatim
    Text(String),
    /// Any numeric content (integers are stored as whole floats)
    Number(f64),
    /// Boolean content
    Bool(bool),
    /// Calendar date-time without timezone
    Date(NaiveDateTime),
}

pub(crate) static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Build a text cell
    #[cfg(test)]
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// True for blank cells and whitespace-only text
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Integral numeric content (e.g. `12.0` -> `12`)
    pub fn as_whole_number(&self) -> Option<i64> {
        match self {
            Cell::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    /// Text used for marker matching and string fields.
    ///
    /// Whole numbers print without a decimal part so that a `1` typed into a
    /// cell compares equal to the text "1".
    pub fn display_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::Date(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Bool(_) => 1,
            Cell::Number(_) => 2,
            Cell::Date(_) => 3,
            Cell::Text(_) => 4,
        }
    }
}

/// Format a number the way a spreadsheet shows it by default
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_text())
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}

// Cells are used inside aggregation keys, so they need a total order.
// Numbers compare with `total_cmp`, which makes NaN equal to itself.
impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Empty, Cell::Empty) => Ordering::Equal,
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            (Cell::Number(a), Cell::Number(b)) => a.total_cmp(b),
            (Cell::Date(a), Cell::Date(b)) => a.cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// One worksheet as rows of cells, anchored at A1
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorksheetGrid {
    rows: Vec<Vec<Cell>>,
}

impl WorksheetGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// All rows, top to bottom
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the widest row
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// True when every cell is blank
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.iter().all(Cell::is_empty))
    }

    /// Cell at (row, col), or `None` outside the grid
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Cell at (row, col); positions outside the grid read as blank
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.get(row, col).unwrap_or(&EMPTY_CELL)
    }

    /// Build a grid from string literals, blank strings become empty cells
    #[cfg(test)]
    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|r| {
                    r.iter()
                        .map(|s| if s.is_empty() { Cell::Empty } else { Cell::text(*s) })
                        .collect()
                })
                .collect(),
        )
    }
}

/// A named worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub grid: WorksheetGrid,
}

/// A parsed workbook: sheets in workbook order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Look up a sheet grid by exact name
    pub fn sheet(&self, name: &str) -> Option<&WorksheetGrid> {
        self.sheets.iter().find(|s| s.name == name).map(|s| &s.grid)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }
}
