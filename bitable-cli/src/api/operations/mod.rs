//! Bitable write operations
//!
//! Pipelines plan their writes as an [`Operations`] list and hand it to a
//! [`RecordSink`](crate::api::RecordSink) for execution, one call at a time.

pub mod operation;

pub use operation::{Operation, OperationResult};

use anyhow::{Result, bail};

/// Ordered list of operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operations {
    operations: Vec<Operation>,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of planned updates
    pub fn update_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Update { .. }))
            .count()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Execute in order.
    ///
    /// A failed create is logged and counted. A failed update aborts the run,
    /// since updates write back to the row that triggered it.
    pub async fn execute(&self, sink: &dyn crate::api::RecordSink) -> Result<ExecutionSummary> {
        let mut summary = ExecutionSummary::default();

        for (index, operation) in self.operations.iter().enumerate() {
            log::debug!("[{}/{}] {}", index + 1, self.operations.len(), operation);
            let result = operation.execute(sink).await;

            match (&result.operation, result.success) {
                (Operation::Create { .. }, true) => {
                    summary.created += 1;
                    log::debug!("Created {}", result.record_id.as_deref().unwrap_or("record"));
                }
                (Operation::Update { .. }, true) => summary.updated += 1,
                (Operation::Create { .. }, false) => {
                    summary.failed += 1;
                    log::error!(
                        "Failed to {}: {}",
                        operation,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                (Operation::Update { record_id, .. }, false) => {
                    bail!(
                        "Failed to update record {}: {}",
                        record_id,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }

        Ok(summary)
    }
}

impl From<Vec<Operation>> for Operations {
    fn from(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

impl IntoIterator for Operations {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}
