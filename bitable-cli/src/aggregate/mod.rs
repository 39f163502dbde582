//! Folding extracted rows into keyed records

pub mod audit;
pub mod monitoring;

pub use audit::{AuditAggregate, AuditKey, AuditSummary};
pub use monitoring::MonitoringAggregate;
