//! Audit pipeline: QSA / QSA+ report to score update and issue records

use crate::aggregate::{AuditAggregate, AuditKey, AuditSummary};
use crate::api::{FieldValue, Fields, Operation, Operations};
use crate::extract::extract_audit_entries;

use super::{NamedWorkbook, PipelineContext, WriteTargets, put, workbooks};

const DATE_RANGE_SEPARATORS: &[char] = &['~', '～'];

/// Split "start~end" into normalized timestamps; either side may fail alone
fn audit_dates(range: &str, ctx: &PipelineContext) -> (Option<i64>, Option<i64>) {
    let parts: Vec<&str> = range.split(DATE_RANGE_SEPARATORS).map(str::trim).collect();
    let [start, end] = parts.as_slice() else {
        log::warn!("Audit date '{}' is not a 'start~end' range, dates omitted", range);
        return (None, None);
    };

    let parse = |label: &str, text: &str| match ctx.normalizer.from_text(text) {
        Ok(millis) => Some(millis),
        Err(e) => {
            log::warn!("Audit {} date omitted: {}", label, e);
            None
        }
    };
    (parse("start", *start), parse("end", *end))
}

/// Fields written back to the triggering row for one audit
fn score_fields(key: &AuditKey, summary: &AuditSummary, ctx: &PipelineContext) -> Fields {
    let mut fields = Fields::new();
    fields.insert("工厂名称".to_string(), FieldValue::text(&key.factory));
    fields.insert("审核员".to_string(), FieldValue::text(&key.inspector));

    let (start, end) = audit_dates(&key.date_range, ctx);
    put(&mut fields, "审核开始日期", start.map(FieldValue::Timestamp));
    put(&mut fields, "审核结束日期", end.map(FieldValue::Timestamp));
    put(&mut fields, key.item_type.score_field(), FieldValue::from_cell(&summary.score));
    fields
}

/// One record per distinct issue; issues with an unusable due date are skipped
fn issue_operations(key: &AuditKey, summary: &AuditSummary, table_id: &str, ctx: &PipelineContext) -> Vec<Operation> {
    summary
        .issues
        .iter()
        .filter_map(|(issue, description)| {
            let due = match ctx.normalizer.from_cell(&issue.due_date) {
                Ok(millis) => millis,
                Err(e) => {
                    log::warn!(
                        "Issue {} of {} skipped, due date '{}': {}",
                        issue.clause,
                        key.factory,
                        issue.due_date,
                        e
                    );
                    return None;
                }
            };

            let mut fields = Fields::new();
            fields.insert("工厂名称".to_string(), FieldValue::text(&key.factory));
            fields.insert("审核员".to_string(), FieldValue::text(&key.inspector));
            fields.insert("审核日期".to_string(), FieldValue::text(&key.date_range));
            fields.insert("审核项".to_string(), FieldValue::text(key.item_type.label()));
            fields.insert("审核条款".to_string(), FieldValue::text(&issue.clause));
            fields.insert("审核标准".to_string(), FieldValue::text(&issue.standard));
            fields.insert("符合等级".to_string(), FieldValue::text(&issue.grade));
            fields.insert("根因分析".to_string(), FieldValue::text(&issue.root_cause));
            fields.insert("改进计划".to_string(), FieldValue::text(&issue.corrective_plan));
            fields.insert("计划完成时限".to_string(), FieldValue::Timestamp(due));
            fields.insert("问题描述".to_string(), FieldValue::text(description));
            Some(Operation::create(table_id, fields))
        })
        .collect()
}

/// Plan the audit writes: for every audit, update the triggering row, then
/// create its issue records.
///
/// Audits are keyed by their deficiency rows, so a report without any
/// deficiency writes nothing, not even its score.
pub fn plan(named: &[NamedWorkbook], ctx: &PipelineContext, targets: &WriteTargets) -> Operations {
    let aggregate: AuditAggregate = workbooks(named)
        .flat_map(|workbook| extract_audit_entries(workbook, &ctx.reference))
        .collect();
    log::info!(
        "Audit report: {} audits, {} distinct issues",
        aggregate.len(),
        aggregate.issue_count()
    );

    if aggregate.len() == 0 {
        log::info!("No deficiency rows found, nothing to write back");
    }
    if targets.qsa_table_id.is_none() && aggregate.issue_count() > 0 {
        log::warn!("QSA_TABLE_ID is not set, {} issue records skipped", aggregate.issue_count());
    }

    let mut operations = Operations::new();
    for (key, summary) in aggregate.audits() {
        operations.add(Operation::update(
            &targets.source_table_id,
            &targets.row_id,
            score_fields(key, summary, ctx),
        ));
        if let Some(table_id) = &targets.qsa_table_id {
            for op in issue_operations(key, summary, table_id, ctx) {
                operations.add(op);
            }
        }
    }
    operations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::sink::testing::RecordingSink;
    use crate::reference::ReferenceData;
    use crate::timestamp::TimestampNormalizer;
    use crate::workbook::{Cell, Sheet, Workbook, WorksheetGrid};

    // 2024-03-01 / 2024-03-02 / 2024-04-01 00:00 at UTC+8
    const MAR_01: i64 = 1_709_222_400_000;
    const MAR_02: i64 = 1_709_308_800_000;
    const APR_01: i64 = 1_711_900_800_000;

    fn ctx() -> PipelineContext {
        PipelineContext::new(ReferenceData::embedded().unwrap(), TimestampNormalizer::default())
    }

    fn targets(qsa: Option<&str>) -> WriteTargets {
        WriteTargets {
            source_table_id: "tblSource".to_string(),
            row_id: "recRow".to_string(),
            qsa_table_id: qsa.map(str::to_string),
            target_table_id: None,
        }
    }

    fn report(date_range: &str, rows: &[(&str, &str, Cell)]) -> NamedWorkbook {
        let mut grid = vec![
            vec![Cell::text("工厂名称："), Cell::Empty, Cell::text("甘肃圣越农牧发展有限公司")],
            vec![Cell::text("审核员："), Cell::Empty, Cell::text("李四")],
            vec![Cell::text("审核日期："), Cell::Empty, Cell::text(date_range)],
            vec![Cell::text("审核项目："), Cell::Empty, Cell::text("QSA+")],
            vec![Cell::text("审核得分："), Cell::Empty, Cell::Number(88.0)],
            vec![
                Cell::text("条款"),
                Cell::text("标准"),
                Cell::text("符合等级"),
                Cell::text("问题描述"),
                Cell::text("根因分析"),
                Cell::text("改进计划"),
                Cell::text("完成时限"),
            ],
        ];
        for (clause, grade, due) in rows {
            grid.push(vec![
                Cell::text(*clause),
                Cell::text("标准"),
                Cell::text(*grade),
                Cell::text("描述"),
                Cell::text("根因"),
                Cell::text("计划"),
                due.clone(),
            ]);
        }
        NamedWorkbook {
            name: "QSA.xlsx".to_string(),
            workbook: Workbook::new(vec![Sheet {
                name: "审核明细".to_string(),
                grid: WorksheetGrid::new(grid),
            }]),
        }
    }

    #[test]
    fn test_plan_updates_row_then_creates_issues() {
        let workbook = report(
            "2024-03-01~2024-03-02",
            &[
                ("1.1", "S", Cell::text("2024-04-01")),
                ("1.2", "符合", Cell::Empty),
                ("1.3", "M", Cell::Number(45383.0)),
            ],
        );
        let ops = plan(&[workbook], &ctx(), &targets(Some("tblIssues")));
        assert_eq!(ops.len(), 3);

        let Operation::Update { table_id, record_id, fields } = &ops.operations()[0] else {
            panic!("first operation should update the source row");
        };
        assert_eq!(table_id, "tblSource");
        assert_eq!(record_id, "recRow");
        assert_eq!(fields["工厂名称"], FieldValue::text("圣越工厂"));
        assert_eq!(fields["审核员"], FieldValue::text("李四"));
        assert_eq!(fields["审核开始日期"], FieldValue::Timestamp(MAR_01));
        assert_eq!(fields["审核结束日期"], FieldValue::Timestamp(MAR_02));
        assert_eq!(fields["QSA+得分"], FieldValue::Int(88));
        assert!(!fields.contains_key("QSA得分"));

        for op in &ops.operations()[1..] {
            assert_eq!(op.table_id(), "tblIssues");
            assert_eq!(op.fields()["计划完成时限"], FieldValue::Timestamp(APR_01));
            assert_eq!(op.fields()["审核项"], FieldValue::text("QSA+"));
            assert_eq!(op.fields()["审核日期"], FieldValue::text("2024-03-01~2024-03-02"));
        }
    }

    #[test]
    fn test_report_without_deficiencies_writes_no_score() {
        let ops = plan(&[report("2024-03-01~2024-03-02", &[])], &ctx(), &targets(Some("tblIssues")));
        assert!(ops.is_empty());
    }

    #[test]
    fn test_malformed_range_omits_dates() {
        let ops = plan(
            &[report("2024-03-01", &[("1.1", "S", Cell::text("2024-04-01"))])],
            &ctx(),
            &targets(None),
        );
        assert_eq!(ops.len(), 1);
        let fields = ops.operations()[0].fields();
        assert!(!fields.contains_key("审核开始日期"));
        assert!(!fields.contains_key("审核结束日期"));
    }

    #[test]
    fn test_issue_with_bad_due_date_is_skipped() {
        let workbook = report(
            "2024-03-01~2024-03-02",
            &[("1.1", "S", Cell::text("尽快")), ("1.2", "M", Cell::text("2024-04-01"))],
        );
        let ops = plan(&[workbook], &ctx(), &targets(Some("tblIssues")));
        assert_eq!(ops.len(), 2);
        assert_eq!(ops.operations()[1].fields()["审核条款"], FieldValue::text("1.2"));
    }

    #[tokio::test]
    async fn test_plan_executes_against_sink() {
        let workbook = report("2024-03-01～2024-03-02", &[("1.1", "S", Cell::text("2024-04-01"))]);
        let ops = plan(&[workbook], &ctx(), &targets(Some("tblIssues")));
        let sink = RecordingSink::new();
        let summary = ops.execute(&sink).await.unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(sink.recorded(), ops.operations().to_vec());
    }
}
