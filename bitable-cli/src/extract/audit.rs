//! QSA audit report extraction
//!
//! An audit sheet carries a header block of labels (factory, inspector, date
//! range, audit item, score) and a deficiency table whose header row contains
//! the grade column `符合等级`. Every non-compliant row of that table becomes
//! one [`ExtractedEntry`] carrying the header block values.

use super::anchor::{Anchor, locate, read_labeled_text};
use crate::reference::ReferenceData;
use crate::workbook::{Cell, Workbook, WorksheetGrid};

pub const FACTORY_LABEL: &str = "工厂名称：";
pub const INSPECTOR_LABEL: &str = "审核员：";
pub const DATE_RANGE_LABEL: &str = "审核日期：";
pub const ITEM_LABEL: &str = "审核项目：";
pub const SCORE_LABEL: &str = "审核得分：";
pub const GRADE_HEADER: &str = "符合等级";

/// Labels hold their value two columns to the right
const LABEL_VALUE_OFFSET: isize = 2;

// Deficiency table columns, relative to the grade column
const CLAUSE_OFFSET: isize = -2;
const STANDARD_OFFSET: isize = -1;
const DESCRIPTION_OFFSET: isize = 1;
const ROOT_CAUSE_OFFSET: isize = 2;
const PLAN_OFFSET: isize = 3;
const DUE_DATE_OFFSET: isize = 4;

/// Audit item classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemType {
    Qsa,
    QsaPlus,
}

impl ItemType {
    /// Classify the text of the `审核项目：` field
    pub fn parse(text: &str) -> Option<Self> {
        let normalized: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '＋' { '+' } else { c })
            .collect::<String>()
            .to_uppercase();
        match normalized.as_str() {
            "QSA" => Some(ItemType::Qsa),
            "QSA+" => Some(ItemType::QsaPlus),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemType::Qsa => "QSA",
            ItemType::QsaPlus => "QSA+",
        }
    }

    /// Score field on the source row
    pub fn score_field(&self) -> &'static str {
        match self {
            ItemType::Qsa => "QSA得分",
            ItemType::QsaPlus => "QSA+得分",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One deficiency row together with its audit header values
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEntry {
    /// Short factory code
    pub factory: String,
    pub inspector: String,
    /// Raw "start~end" text
    pub date_range: String,
    pub item_type: ItemType,
    pub score: Cell,
    pub clause: String,
    pub standard: String,
    pub grade: String,
    pub root_cause: String,
    pub corrective_plan: String,
    /// Raw due date cell, normalized when written
    pub due_date: Cell,
    pub description: String,
}

/// Header block values shared by every entry of a sheet
#[derive(Debug, Clone, PartialEq)]
struct AuditHeader {
    factory: String,
    inspector: String,
    date_range: String,
    item_type: ItemType,
    score: Cell,
}

fn read_header(grid: &WorksheetGrid, sheet_name: &str, reference: &ReferenceData) -> Option<AuditHeader> {
    let factory_text = read_labeled_text(grid, FACTORY_LABEL, LABEL_VALUE_OFFSET);
    let Some(factory) = reference.factories.resolve(&factory_text) else {
        log::warn!(
            "Sheet '{}': unknown factory '{}', entries discarded",
            sheet_name,
            factory_text
        );
        return None;
    };

    let item_text = read_labeled_text(grid, ITEM_LABEL, LABEL_VALUE_OFFSET);
    let Some(item_type) = ItemType::parse(&item_text) else {
        log::warn!(
            "Sheet '{}': unrecognized audit item '{}', entries discarded",
            sheet_name,
            item_text
        );
        return None;
    };

    let score = match locate(grid, SCORE_LABEL) {
        Some(anchor) => anchor.beside(grid, LABEL_VALUE_OFFSET).clone(),
        None => Cell::Empty,
    };

    Some(AuditHeader {
        factory: factory.to_string(),
        inspector: read_labeled_text(grid, INSPECTOR_LABEL, LABEL_VALUE_OFFSET),
        date_range: read_labeled_text(grid, DATE_RANGE_LABEL, LABEL_VALUE_OFFSET),
        item_type,
        score,
    })
}

fn text_at(grid: &WorksheetGrid, anchor: Anchor, col_offset: isize) -> String {
    anchor.beside(grid, col_offset).display_text().trim().to_string()
}

/// Extract deficiency entries from one sheet
pub fn extract_sheet_entries(
    grid: &WorksheetGrid,
    sheet_name: &str,
    reference: &ReferenceData,
) -> Vec<ExtractedEntry> {
    let Some(grade_header) = locate(grid, GRADE_HEADER) else {
        log::debug!("Sheet '{}' has no '{}' header, skipped", sheet_name, GRADE_HEADER);
        return Vec::new();
    };
    let Some(header) = read_header(grid, sheet_name, reference) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for row in grade_header.row + 1..grid.height() {
        let anchor = Anchor::new(row, grade_header.col);
        let grade = text_at(grid, anchor, 0);
        if grade.is_empty() || reference.is_compliant_grade(&grade) {
            continue;
        }

        entries.push(ExtractedEntry {
            factory: header.factory.clone(),
            inspector: header.inspector.clone(),
            date_range: header.date_range.clone(),
            item_type: header.item_type,
            score: header.score.clone(),
            clause: text_at(grid, anchor, CLAUSE_OFFSET),
            standard: text_at(grid, anchor, STANDARD_OFFSET),
            grade,
            root_cause: text_at(grid, anchor, ROOT_CAUSE_OFFSET),
            corrective_plan: text_at(grid, anchor, PLAN_OFFSET),
            due_date: anchor.beside(grid, DUE_DATE_OFFSET).clone(),
            description: text_at(grid, anchor, DESCRIPTION_OFFSET),
        });
    }

    log::debug!("Sheet '{}': {} deficiency rows", sheet_name, entries.len());
    entries
}

/// Extract entries from every sheet carrying a grade header
pub fn extract_audit_entries(workbook: &Workbook, reference: &ReferenceData) -> Vec<ExtractedEntry> {
    workbook
        .sheets()
        .iter()
        .flat_map(|sheet| extract_sheet_entries(&sheet.grid, &sheet.name, reference))
        .collect()
}
