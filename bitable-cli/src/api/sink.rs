//! Destinations for record writes

use anyhow::Result;
use async_trait::async_trait;
use colored::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::value::Fields;

/// Something that accepts record creates and updates
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Create a record, returning its id
    async fn create(&self, table_id: &str, fields: &Fields) -> Result<String>;

    /// Update a record, returning its id
    async fn update(&self, table_id: &str, record_id: &str, fields: &Fields) -> Result<String>;
}

/// Prints planned writes instead of sending them
#[derive(Debug, Default)]
pub struct DryRunSink {
    counter: AtomicUsize,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn print(&self, header: String, fields: &Fields) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        println!("{} {}", format!("[{}]", n).dimmed(), header);
        for (name, value) in fields {
            println!("    {}: {}", name.cyan(), value);
        }
        format!("dry-run-{}", n)
    }
}

#[async_trait]
impl RecordSink for DryRunSink {
    async fn create(&self, table_id: &str, fields: &Fields) -> Result<String> {
        Ok(self.print(format!("{} {}", "CREATE".green().bold(), table_id), fields))
    }

    async fn update(&self, table_id: &str, record_id: &str, fields: &Fields) -> Result<String> {
        self.print(
            format!("{} {} / {}", "UPDATE".yellow().bold(), table_id, record_id),
            fields,
        );
        Ok(record_id.to_string())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::api::{FieldValue, Operation};
    use anyhow::bail;
    use std::sync::Mutex;

    /// Records successful writes; fails any write whose text fields contain a marker
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        recorded: Mutex<Vec<Operation>>,
        fail_marker: Option<String>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(marker: &str) -> Self {
            Self {
                recorded: Mutex::new(Vec::new()),
                fail_marker: Some(marker.to_string()),
            }
        }

        pub fn recorded(&self) -> Vec<Operation> {
            self.recorded.lock().unwrap().clone()
        }

        fn should_fail(&self, fields: &Fields) -> bool {
            match &self.fail_marker {
                Some(marker) => fields
                    .values()
                    .any(|v| matches!(v, FieldValue::Text(s) if s.contains(marker.as_str()))),
                None => false,
            }
        }
    }

    #[async_trait]
    impl RecordSink for RecordingSink {
        async fn create(&self, table_id: &str, fields: &Fields) -> Result<String> {
            if self.should_fail(fields) {
                bail!("rejected by test sink");
            }
            let mut recorded = self.recorded.lock().unwrap();
            recorded.push(Operation::create(table_id, fields.clone()));
            Ok(format!("rec{}", recorded.len()))
        }

        async fn update(&self, table_id: &str, record_id: &str, fields: &Fields) -> Result<String> {
            if self.should_fail(fields) {
                bail!("rejected by test sink");
            }
            self.recorded
                .lock()
                .unwrap()
                .push(Operation::update(table_id, record_id, fields.clone()));
            Ok(record_id.to_string())
        }
    }
}
