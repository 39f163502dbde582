//! Excel workbook loading
//!
//! Turns `.xlsx` / `.xls` content into ordered sheet-name → grid mappings.
//! Positions in a grid are absolute (row 0, column 0 is A1).

mod grid;
mod reader;
mod sanitize;

pub use grid::{Cell, Sheet, Workbook, WorksheetGrid};
pub(crate) use grid::EMPTY_CELL;
pub use reader::{is_excel_file_name, read_workbook, read_workbook_file};
