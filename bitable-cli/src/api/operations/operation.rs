//! Core operation types for bitable record writes

use crate::api::sink::RecordSink;
use crate::api::value::Fields;

/// A single write against a bitable table
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create a new record
    Create {
        /// Table id (`tbl...`)
        table_id: String,
        fields: Fields,
    },
    /// Update fields of an existing record
    Update {
        table_id: String,
        /// Record id (`rec...`)
        record_id: String,
        fields: Fields,
    },
}

/// Result of executing an [`Operation`]
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    /// The operation that was executed
    pub operation: Operation,
    /// Whether the operation succeeded
    pub success: bool,
    /// Record id returned by the service
    pub record_id: Option<String>,
    /// Error message if the operation failed
    pub error: Option<String>,
}

impl Operation {
    pub fn create(table_id: impl Into<String>, fields: Fields) -> Self {
        Self::Create {
            table_id: table_id.into(),
            fields,
        }
    }

    pub fn update(table_id: impl Into<String>, record_id: impl Into<String>, fields: Fields) -> Self {
        Self::Update {
            table_id: table_id.into(),
            record_id: record_id.into(),
            fields,
        }
    }

    pub fn table_id(&self) -> &str {
        match self {
            Self::Create { table_id, .. } | Self::Update { table_id, .. } => table_id,
        }
    }

    pub fn fields(&self) -> &Fields {
        match self {
            Self::Create { fields, .. } | Self::Update { fields, .. } => fields,
        }
    }

    /// Execute against a sink; failures are captured in the result
    pub async fn execute(&self, sink: &dyn RecordSink) -> OperationResult {
        let outcome = match self {
            Self::Create { table_id, fields } => sink.create(table_id, fields).await,
            Self::Update {
                table_id,
                record_id,
                fields,
            } => sink.update(table_id, record_id, fields).await,
        };
        match outcome {
            Ok(record_id) => OperationResult::success(self.clone(), Some(record_id)),
            Err(e) => OperationResult::error(self.clone(), format!("{:#}", e)),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create { .. } => write!(f, "create in {}", self.table_id())?,
            Self::Update { record_id, .. } => write!(f, "update {} in {}", record_id, self.table_id())?,
        }
        write!(f, " ({} fields)", self.fields().len())
    }
}

impl OperationResult {
    pub fn success(operation: Operation, record_id: Option<String>) -> Self {
        Self {
            operation,
            success: true,
            record_id,
            error: None,
        }
    }

    pub fn error(operation: Operation, error: String) -> Self {
        Self {
            operation,
            success: false,
            record_id: None,
            error: Some(error),
        }
    }
}
