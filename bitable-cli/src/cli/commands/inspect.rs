//! Offline workbook inspection

use anyhow::{Result, bail};
use colored::*;

use crate::cli::InspectArgs;
use crate::extract::locate;
use crate::workbook::{Sheet, read_workbook_file};

/// Spreadsheet column name of a zero-based index (0 -> A, 26 -> AA)
pub fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// A1-style reference of a zero-based position
pub fn cell_reference(row: usize, col: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}

fn print_sheet(sheet: &Sheet, args: &InspectArgs) {
    let grid = &sheet.grid;
    println!(
        "{} {} rows x {} cols",
        sheet.name.bold(),
        grid.height(),
        grid.width()
    );
    if grid.is_empty() {
        println!("  {}", "(no content)".dimmed());
        return;
    }

    if let Some(marker) = &args.marker {
        match locate(grid, marker) {
            Some(anchor) => println!(
                "  '{}' at {} (row {}, col {})",
                marker,
                cell_reference(anchor.row, anchor.col).green(),
                anchor.row,
                anchor.col
            ),
            None => println!("  '{}' {}", marker, "not found".dimmed()),
        }
    }

    if args.dump {
        for (r, row) in grid.rows().iter().enumerate() {
            if row.iter().all(|c| c.is_empty()) {
                continue;
            }
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_empty())
                .map(|(c, cell)| format!("{}={}", cell_reference(r, c).dimmed(), cell))
                .collect();
            println!("  {:>4}  {}", r, cells.join("  "));
        }
    }
}

/// Print sheet dimensions, an optional marker location and optionally the cells
pub fn handle_inspect_command(args: InspectArgs) -> Result<()> {
    let workbook = read_workbook_file(&args.file)?;
    println!(
        "{} ({} sheets)",
        args.file.display().to_string().cyan(),
        workbook.len()
    );

    let sheets: Vec<&Sheet> = match &args.sheet {
        Some(name) => workbook.sheets().iter().filter(|s| &s.name == name).collect(),
        None => workbook.sheets().iter().collect(),
    };
    if sheets.is_empty() {
        bail!(
            "Sheet '{}' not found, available: {}",
            args.sheet.as_deref().unwrap_or_default(),
            workbook.sheet_names().join(", ")
        );
    }

    for sheet in sheets {
        print_sheet(sheet, &args);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_cell_reference() {
        assert_eq!(cell_reference(0, 0), "A1");
        assert_eq!(cell_reference(7, 13), "N8");
    }
}
