//! Bitable open API module
//!
//! Token issuance, record search/create/update and attachment download over
//! the vendor REST API, plus the [`RecordSink`] seam the pipelines write
//! through.

pub mod attachments;
pub mod auth;
pub mod client;
pub mod config;
pub mod models;
pub mod operations;
pub mod sink;
pub mod value;

pub use attachments::locate_excel_attachments;
pub use auth::Credentials;
pub use client::BitableClient;
pub use config::ClientConfig;
pub use operations::{Operation, Operations};
pub use sink::{DryRunSink, RecordSink};
pub use value::{FieldValue, Fields};
