//! Unit-weight inspection sheet extraction
//!
//! Each sheet records piece weights for one process step. The header block
//! position depends on the process; samples are laid out one group per
//! column starting at the `第1个` row, with sample times along row 7.

use super::anchor::{locate, matches_marker};
use crate::workbook::{Cell, WorksheetGrid};

pub const PROCESS_MARKER: &str = "工序";
pub const FIRST_SAMPLE_MARKER: &str = "第1个";

/// Upper limit used when the sheet leaves it blank
pub const DEFAULT_UPPER_LIMIT: f64 = 9999.0;

const TIME_ROW: usize = 7;
const TIME_COLUMNS: std::ops::RangeInclusive<usize> = 7..=31;
const GROUP_COLUMNS: std::ops::Range<usize> = 2..30;

/// Header cell positions for one process family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    pub product: (usize, usize),
    pub order: (usize, usize),
    pub lower: (usize, usize),
    pub upper: (usize, usize),
    pub group_size: (usize, usize),
}

const STEAMED: HeaderLayout = HeaderLayout {
    product: (0, 2),
    order: (1, 2),
    lower: (3, 2),
    upper: (3, 3),
    group_size: (4, 2),
};

const FRIED: HeaderLayout = HeaderLayout {
    product: (0, 1),
    order: (1, 1),
    lower: (3, 1),
    upper: (3, 2),
    group_size: (4, 1),
};

const PACKAGED: HeaderLayout = HeaderLayout {
    product: (0, 1),
    order: (1, 1),
    lower: (3, 2),
    upper: (3, 3),
    group_size: (4, 1),
};

const RAW_INSPECTION: HeaderLayout = FRIED;

impl HeaderLayout {
    /// Layout for a process name, `None` for processes without weight sheets
    pub fn for_process(process: &str) -> Option<Self> {
        let process = process.trim();
        match process {
            "蒸煮后" | "蒸后" => Some(STEAMED),
            "一次包装" => Some(PACKAGED),
            "原料全检" => Some(RAW_INSPECTION),
            p if p.contains("炸后") || p.contains("炭烤") => Some(FRIED),
            _ => None,
        }
    }
}

/// Header values of a weight sheet
#[derive(Debug, Clone, PartialEq)]
pub struct WeightHeader {
    pub process: String,
    pub product: Cell,
    pub order: Cell,
    pub lower: Cell,
    pub upper: Cell,
    pub group_size: usize,
}

/// One group of weights paired with its sample time
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSample {
    pub time: Cell,
    pub weights: Vec<i64>,
}

impl WeightSample {
    /// Weights as "a,b,c"
    pub fn joined(&self) -> String {
        self.weights
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Everything extracted from one weight sheet
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSheet {
    pub header: WeightHeader,
    pub samples: Vec<WeightSample>,
}

/// Process name: the first non-empty cell one or two columns right of `工序`
pub fn read_process(grid: &WorksheetGrid) -> Option<String> {
    let anchor = locate(grid, PROCESS_MARKER)?;
    [1, 2]
        .iter()
        .map(|offset| anchor.beside(grid, *offset))
        .find(|cell| !cell.is_empty())
        .map(|cell| cell.display_text().trim().to_string())
}

fn read_header(grid: &WorksheetGrid, process: &str, layout: HeaderLayout) -> Option<WeightHeader> {
    let at = |(row, col): (usize, usize)| grid.cell(row, col).clone();

    let group_size_cell = at(layout.group_size);
    let group_size = match group_size_cell.as_whole_number() {
        Some(n) if n > 0 => n as usize,
        _ => {
            log::warn!(
                "Process '{}': group size '{}' is not a whole number",
                process,
                group_size_cell
            );
            return None;
        }
    };

    let upper = match at(layout.upper) {
        cell if cell.is_empty() => Cell::Number(DEFAULT_UPPER_LIMIT),
        cell => cell,
    };

    Some(WeightHeader {
        process: process.to_string(),
        product: at(layout.product),
        order: at(layout.order),
        lower: at(layout.lower),
        upper,
        group_size,
    })
}

/// Non-empty cells of the sample time row
fn read_times(grid: &WorksheetGrid) -> Vec<Cell> {
    TIME_COLUMNS
        .map(|col| grid.cell(TIME_ROW, col))
        .filter(|cell| !cell.is_empty())
        .cloned()
        .collect()
}

/// Weight groups, one per column, keeping non-zero whole numbers
fn read_groups(grid: &WorksheetGrid, first_row: usize, group_size: usize) -> Vec<Vec<i64>> {
    GROUP_COLUMNS
        .map(|col| {
            (first_row..first_row + group_size)
                .filter_map(|row| grid.cell(row, col).as_whole_number())
                .filter(|w| *w != 0)
                .collect::<Vec<_>>()
        })
        .filter(|group| !group.is_empty())
        .collect()
}

/// Extract one weight sheet, `None` when the sheet is not a weight record
pub fn extract_weight_sheet(grid: &WorksheetGrid, sheet_name: &str) -> Option<WeightSheet> {
    if locate(grid, PROCESS_MARKER).is_none() {
        log::warn!("Sheet '{}': no '{}' cell", sheet_name, PROCESS_MARKER);
        return None;
    }
    let Some(process) = read_process(grid) else {
        log::warn!("Sheet '{}': process name is empty", sheet_name);
        return None;
    };
    let Some(layout) = HeaderLayout::for_process(&process) else {
        log::info!("Sheet '{}': process '{}' has no weight layout, skipped", sheet_name, process);
        return None;
    };
    let Some(first) = grid
        .rows()
        .iter()
        .enumerate()
        .find_map(|(r, row)| row.iter().any(|c| matches_marker(c, FIRST_SAMPLE_MARKER)).then_some(r))
    else {
        log::warn!("Sheet '{}': no '{}' row", sheet_name, FIRST_SAMPLE_MARKER);
        return None;
    };

    let header = read_header(grid, &process, layout)?;
    if first + header.group_size > grid.height() {
        log::warn!(
            "Sheet '{}': group size {} runs past the last row ({} rows from '{}')",
            sheet_name,
            header.group_size,
            grid.height().saturating_sub(first),
            FIRST_SAMPLE_MARKER
        );
        return None;
    }
    let times = read_times(grid);
    let groups = read_groups(grid, first, header.group_size);

    if groups.len() > times.len() {
        log::warn!(
            "Sheet '{}': {} weight groups but only {} sample times, extra groups dropped",
            sheet_name,
            groups.len(),
            times.len()
        );
    }

    let samples: Vec<WeightSample> = groups
        .into_iter()
        .zip(times)
        .map(|(weights, time)| WeightSample { time, weights })
        .collect();

    if samples.is_empty() {
        log::warn!("Sheet '{}': no weight data", sheet_name);
        return None;
    }

    Some(WeightSheet { header, samples })
}
