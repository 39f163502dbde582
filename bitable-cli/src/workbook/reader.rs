//! Read Excel workbooks into sheet grids
//!
//! Accepts `.xlsx` and `.xls` content from memory. Every sheet becomes a
//! [`WorksheetGrid`] anchored at A1, so templates can be addressed by absolute
//! row/column positions even when the sheet's used range starts further in.

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Cursor;
use std::path::Path;

use super::grid::{Cell, Sheet, Workbook, WorksheetGrid};
use super::sanitize::strip_worksheet_ids;
use crate::timestamp::serial_to_datetime;

/// File extensions the reader understands
pub const EXCEL_EXTENSIONS: &[&str] = &[".xlsx", ".xls"];

/// Returns true when the file name carries an Excel extension
pub fn is_excel_file_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    EXCEL_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Parse workbook bytes into grids.
///
/// If an `.xlsx` package fails to parse, the worksheet parts are cleaned of
/// stray `id` attributes and parsing is retried once.
pub fn read_workbook(bytes: &[u8], file_name: &str) -> Result<Workbook> {
    match parse_workbook(bytes) {
        Ok(workbook) => Ok(workbook),
        Err(first_err) if !file_name.to_lowercase().ends_with(".xls") => {
            log::warn!(
                "Failed to parse {} ({:#}), retrying with cleaned worksheet XML",
                file_name,
                first_err
            );
            let cleaned = strip_worksheet_ids(bytes)
                .with_context(|| format!("Failed to parse workbook {}: {:#}", file_name, first_err))?;
            parse_workbook(&cleaned)
                .with_context(|| format!("Failed to parse workbook {} after cleanup", file_name))
        }
        Err(err) => Err(err).with_context(|| format!("Failed to parse workbook {}", file_name)),
    }
}

/// Read a workbook from a local file
pub fn read_workbook_file<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    read_workbook(&bytes, &file_name)
}

fn parse_workbook(bytes: &[u8]) -> Result<Workbook> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .context("Failed to open Excel content")?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;
        let grid = range_to_grid(&range);
        log::debug!(
            "Parsed sheet '{}': {} rows x {} cols",
            sheet_name,
            grid.height(),
            grid.width()
        );
        sheets.push(Sheet {
            name: sheet_name,
            grid,
        });
    }

    Ok(Workbook::new(sheets))
}

/// Convert a calamine range into a grid anchored at A1
fn range_to_grid(range: &Range<Data>) -> WorksheetGrid {
    let (row_offset, col_offset) = match range.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => return WorksheetGrid::default(),
    };

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(convert_cell));
        rows.push(cells);
    }
    WorksheetGrid::new(rows)
}

/// Convert a calamine cell into a grid cell
pub(crate) fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match serial_to_datetime(dt.as_f64()) {
            Some(parsed) => Cell::Date(parsed),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_cell(s).map(Cell::Date).unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

fn parse_iso_cell(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)))
}
