//! Monitoring pipeline: per-factory deviation and wing median summaries

use crate::aggregate::MonitoringAggregate;
use crate::api::{FieldValue, Fields, Operation, Operations};
use crate::extract::{MONITORING_SHEET, extract_monitoring_rows};

use super::{NamedWorkbook, PipelineContext, WriteTargets};

/// Plan one update of the triggering row per factory and summary kind
pub fn plan(named: &[NamedWorkbook], ctx: &PipelineContext, targets: &WriteTargets) -> Operations {
    let mut aggregate = MonitoringAggregate::new();
    let mut kept = 0usize;

    for source in named {
        let Some(grid) = source.workbook.sheet(MONITORING_SHEET) else {
            log::warn!("{} has no '{}' sheet", source.name, MONITORING_SHEET);
            continue;
        };
        for row in extract_monitoring_rows(grid, &ctx.reference, &ctx.normalizer) {
            if aggregate.add(row) {
                kept += 1;
            }
        }
    }
    log::info!(
        "Monitoring data: {} quality-check rows across {} product days",
        kept,
        aggregate.len()
    );

    let mut operations = Operations::new();
    for field in aggregate.factory_fields() {
        log::debug!("{} = {}", field.name, field.value);
        let mut fields = Fields::new();
        fields.insert(field.name, FieldValue::Text(field.value));
        operations.add(Operation::update(&targets.source_table_id, &targets.row_id, fields));
    }
    operations
}
