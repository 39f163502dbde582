//! Unit-weight pipeline: one record per weight group

use crate::api::{FieldValue, Fields, Operation, Operations};
use crate::extract::{WeightSheet, extract_weight_sheet};

use super::{NamedWorkbook, PipelineContext, put};

fn sample_operations(sheet: &WeightSheet, table_id: &str, ctx: &PipelineContext) -> Vec<Operation> {
    let header = &sheet.header;
    sheet
        .samples
        .iter()
        .map(|sample| {
            let recorded_at = match ctx.normalizer.from_cell(&sample.time) {
                Ok(millis) => Some(FieldValue::Timestamp(millis)),
                Err(e) => {
                    log::warn!("Sample time '{}' omitted: {}", sample.time, e);
                    None
                }
            };

            let mut fields = Fields::new();
            fields.insert("工序".to_string(), FieldValue::text(&header.process));
            put(&mut fields, "记录日期", recorded_at);
            fields.insert("单重数据".to_string(), FieldValue::Text(sample.joined()));
            put(&mut fields, "标准下限", FieldValue::from_cell(&header.lower));
            put(&mut fields, "标准上限", FieldValue::from_cell(&header.upper));
            put(&mut fields, "品名", FieldValue::from_cell(&header.product));
            put(&mut fields, "工艺单", FieldValue::from_cell(&header.order));
            Operation::create(table_id, fields)
        })
        .collect()
}

/// Plan a record in `table_id` for every weight group of every sheet
pub fn plan(named: &[NamedWorkbook], ctx: &PipelineContext, table_id: &str) -> Operations {
    let mut operations = Operations::new();

    for source in named {
        for sheet in source.workbook.sheets() {
            let Some(weights) = extract_weight_sheet(&sheet.grid, &sheet.name) else {
                continue;
            };
            log::info!(
                "{} / {}: process '{}', {} weight groups",
                source.name,
                sheet.name,
                weights.header.process,
                weights.samples.len()
            );
            for op in sample_operations(&weights, table_id, ctx) {
                operations.add(op);
            }
        }
    }
    operations
}
