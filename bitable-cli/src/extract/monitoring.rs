//! Production monitoring sheet extraction
//!
//! The `监测数据` sheet is a flat log: one row per measured control point.
//! Row 0 and 1 are headers; data rows carry a status in column 13.

use chrono::NaiveDate;

use crate::reference::ReferenceData;
use crate::timestamp::TimestampNormalizer;
use crate::workbook::{Cell, WorksheetGrid};

pub const MONITORING_SHEET: &str = "监测数据";

pub const TARGET_MODULE: &str = "生产过程监测";
pub const TARGET_CATEGORY: &str = "原料鸡肉";
pub const TARGET_STEP: &str = "产品品质检查";

const FIRST_DATA_ROW: usize = 2;

mod column {
    pub const FACTORY: usize = 1;
    pub const CATEGORY: usize = 2;
    pub const PRODUCT: usize = 3;
    pub const MODULE: usize = 4;
    pub const STEP: usize = 5;
    pub const GROUP: usize = 6;
    pub const POINT: usize = 7;
    pub const TIME: usize = 9;
    pub const STATUS: usize = 13;
    pub const VALUE: usize = 14;
    pub const STANDARD: usize = 15;
}

/// One measured control point
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringRow {
    /// Spreadsheet row index, for log messages
    pub row: usize,
    /// Short factory code
    pub factory: String,
    /// Product label from the catalog
    pub product: String,
    pub category: String,
    pub module: String,
    pub step: String,
    pub group: String,
    pub point: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub status: String,
    pub value: String,
    pub standard: String,
}

impl MonitoringRow {
    /// True for raw-chicken quality checks of the production process
    pub fn is_quality_check(&self) -> bool {
        self.module == TARGET_MODULE && self.category == TARGET_CATEGORY && self.step == TARGET_STEP
    }
}

/// Date key of an inspection time cell.
///
/// Date cells format directly; text keeps its first ten characters laid out
/// as `YYYY?MM?DD`; numbers are normalized as timestamps.
pub fn date_key(cell: &Cell, normalizer: &TimestampNormalizer) -> Option<String> {
    match cell {
        Cell::Date(dt) => Some(dt.format("%Y-%m-%d").to_string()),
        Cell::Text(s) => text_date_key(s.trim()),
        Cell::Number(n) => normalizer
            .from_number(*n)
            .ok()
            .and_then(|millis| normalizer.date_string(millis)),
        Cell::Empty | Cell::Bool(_) => None,
    }
}

fn text_date_key(s: &str) -> Option<String> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 10 {
        return None;
    }
    let year: String = chars[0..4].iter().collect();
    let month: String = chars[5..7].iter().collect();
    let day: String = chars[8..10].iter().collect();
    let key = format!("{}-{}-{}", year, month, day);
    NaiveDate::parse_from_str(&key, "%Y-%m-%d").ok().map(|_| key)
}

fn text(grid: &WorksheetGrid, row: usize, col: usize) -> String {
    grid.cell(row, col).display_text().trim().to_string()
}

/// Extract monitoring rows whose factory and product resolve
pub fn extract_monitoring_rows(
    grid: &WorksheetGrid,
    reference: &ReferenceData,
    normalizer: &TimestampNormalizer,
) -> Vec<MonitoringRow> {
    let mut rows = Vec::new();

    for row in FIRST_DATA_ROW..grid.height() {
        if grid.cell(row, column::STATUS).is_empty() {
            continue;
        }

        let factory_text = text(grid, row, column::FACTORY);
        let product_text = text(grid, row, column::PRODUCT);
        let factory = reference.factories.resolve(&factory_text);
        let product = reference.products.classify(&product_text);
        let (Some(factory), Some(product)) = (factory, product) else {
            log::warn!(
                "Row {}: factory '{}' or product '{}' not recognized, skipped",
                row,
                factory_text,
                product_text
            );
            continue;
        };

        let time_cell = grid.cell(row, column::TIME);
        let Some(date) = date_key(time_cell, normalizer) else {
            log::warn!("Row {}: inspection time '{}' is not a date, skipped", row, time_cell);
            continue;
        };

        rows.push(MonitoringRow {
            row,
            factory: factory.to_string(),
            product: product.to_string(),
            category: text(grid, row, column::CATEGORY),
            module: text(grid, row, column::MODULE),
            step: text(grid, row, column::STEP),
            group: text(grid, row, column::GROUP),
            point: text(grid, row, column::POINT),
            date,
            status: text(grid, row, column::STATUS),
            value: text(grid, row, column::VALUE),
            standard: text(grid, row, column::STANDARD),
        });
    }

    log::debug!("Extracted {} monitoring rows", rows.len());
    rows
}
