//! Keyed fold of audit entries
//!
//! Entries from every sheet are grouped by the audit they belong to, and
//! identical deficiency rows collapse into one issue.

use std::collections::BTreeMap;

use crate::extract::{ExtractedEntry, ItemType};
use crate::workbook::Cell;

/// Identifies one audit
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AuditKey {
    pub factory: String,
    pub inspector: String,
    pub date_range: String,
    pub item_type: ItemType,
}

/// Identifies one deficiency within an audit
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IssueKey {
    pub clause: String,
    pub standard: String,
    pub grade: String,
    pub root_cause: String,
    pub corrective_plan: String,
    pub due_date: Cell,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuditSummary {
    pub score: Cell,
    /// Issue -> description
    pub issues: BTreeMap<IssueKey, String>,
}

/// Audits keyed by [`AuditKey`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditAggregate {
    audits: BTreeMap<AuditKey, AuditSummary>,
}

impl AuditAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one entry in. A repeated issue keeps the latest description, and
    /// the latest non-blank score wins.
    pub fn add(&mut self, entry: ExtractedEntry) {
        let key = AuditKey {
            factory: entry.factory,
            inspector: entry.inspector,
            date_range: entry.date_range,
            item_type: entry.item_type,
        };
        let summary = self.audits.entry(key).or_default();
        if !entry.score.is_empty() {
            summary.score = entry.score;
        }

        let issue = IssueKey {
            clause: entry.clause,
            standard: entry.standard,
            grade: entry.grade,
            root_cause: entry.root_cause,
            corrective_plan: entry.corrective_plan,
            due_date: entry.due_date,
        };
        if let Some(previous) = summary.issues.insert(issue, entry.description) {
            log::debug!("Duplicate issue row, replaced description '{}'", previous);
        }
    }

    pub fn audits(&self) -> impl Iterator<Item = (&AuditKey, &AuditSummary)> {
        self.audits.iter()
    }

    pub fn len(&self) -> usize {
        self.audits.len()
    }

    /// Total distinct issues across audits
    pub fn issue_count(&self) -> usize {
        self.audits.values().map(|s| s.issues.len()).sum()
    }
}

impl FromIterator<ExtractedEntry> for AuditAggregate {
    fn from_iter<I: IntoIterator<Item = ExtractedEntry>>(iter: I) -> Self {
        let mut aggregate = Self::new();
        for entry in iter {
            aggregate.add(entry);
        }
        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(clause: &str, description: &str) -> ExtractedEntry {
        ExtractedEntry {
            factory: "浦城一厂".to_string(),
            inspector: "张三".to_string(),
            date_range: "2024-03-01~2024-03-02".to_string(),
            item_type: ItemType::Qsa,
            score: Cell::Number(90.0),
            clause: clause.to_string(),
            standard: "标准".to_string(),
            grade: "S".to_string(),
            root_cause: "根因".to_string(),
            corrective_plan: "计划".to_string(),
            due_date: Cell::text("2024-04-01"),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_identical_issues_collapse_last_write_wins() {
        let aggregate: AuditAggregate = vec![entry("1.1", "first"), entry("1.1", "second")]
            .into_iter()
            .collect();
        assert_eq!(aggregate.len(), 1);
        assert_eq!(aggregate.issue_count(), 1);
        let (_, summary) = aggregate.audits().next().unwrap();
        assert_eq!(summary.issues.values().next().unwrap(), "second");
    }

    #[test]
    fn test_distinct_issues_and_audits() {
        let mut plus = entry("2.1", "plus");
        plus.item_type = ItemType::QsaPlus;
        let aggregate: AuditAggregate = vec![entry("1.1", "a"), entry("1.2", "b"), plus]
            .into_iter()
            .collect();
        assert_eq!(aggregate.len(), 2);
        assert_eq!(aggregate.issue_count(), 3);
    }

    #[test]
    fn test_blank_score_does_not_overwrite() {
        let mut blank = entry("1.2", "b");
        blank.score = Cell::Empty;
        let aggregate: AuditAggregate = vec![entry("1.1", "a"), blank].into_iter().collect();
        let (_, summary) = aggregate.audits().next().unwrap();
        assert_eq!(summary.score, Cell::Number(90.0));
    }
}
