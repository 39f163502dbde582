//! End-to-end pipelines: workbook in, planned record writes out
//!
//! Each pipeline has a pure planning step that turns parsed workbooks into an
//! [`Operations`] list, so the extraction and aggregation logic can run
//! without a network. The CLI then executes the plan against the live client
//! or a dry-run sink.

pub mod monitor;
pub mod qsa;
pub mod source;
pub mod weight;

use crate::api::{FieldValue, Fields};
use crate::reference::ReferenceData;
use crate::timestamp::TimestampNormalizer;
use crate::workbook::Workbook;

pub use source::{NamedWorkbook, fetch_remote_workbooks, load_local_workbook};

/// Shared read-only inputs of every pipeline
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub reference: ReferenceData,
    pub normalizer: TimestampNormalizer,
}

impl PipelineContext {
    pub fn new(reference: ReferenceData, normalizer: TimestampNormalizer) -> Self {
        Self {
            reference,
            normalizer,
        }
    }
}

/// Tables and row the planned operations address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTargets {
    /// Table of the triggering row
    pub source_table_id: String,
    /// The triggering row, updated with summaries
    pub row_id: String,
    /// Issue table of the audit pipeline
    pub qsa_table_id: Option<String>,
    /// Record table of the weight pipeline
    pub target_table_id: Option<String>,
}

/// Iterate the workbooks of a run
pub(crate) fn workbooks(named: &[NamedWorkbook]) -> impl Iterator<Item = &Workbook> {
    named.iter().map(|n| &n.workbook)
}

/// Insert a value, leaving the field out when there is none
pub(crate) fn put(fields: &mut Fields, name: &str, value: Option<FieldValue>) {
    if let Some(value) = value {
        fields.insert(name.to_string(), value);
    }
}
