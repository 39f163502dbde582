//! Command handlers

pub mod inspect;
pub mod pipeline;

pub use inspect::handle_inspect_command;
pub use pipeline::{PipelineKind, handle_pipeline_command};
