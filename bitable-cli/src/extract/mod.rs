//! Positional extraction from worksheet templates
//!
//! Each submodule knows one report layout and turns its grid into typed
//! rows. Rows that cannot be resolved are logged and skipped; extraction
//! itself never fails.

pub mod anchor;
pub mod audit;
pub mod monitoring;
pub mod unit_weight;

pub use anchor::locate;
pub use audit::{ExtractedEntry, ItemType, extract_audit_entries};
pub use monitoring::{MONITORING_SHEET, MonitoringRow, extract_monitoring_rows};
pub use unit_weight::{WeightSheet, extract_weight_sheet};
