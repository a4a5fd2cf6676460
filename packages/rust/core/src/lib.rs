//! Pipeline orchestration: one press inquiry in, one issue report out.
//!
//! Consumers construct a [`Pipeline`] from a loaded knowledge store, a chat
//! backend, and an evidence source, then call
//! [`Pipeline::generate_report`] per inquiry.

pub mod pipeline;
pub mod progress;

pub use pipeline::{Pipeline, RunOutcome, RunSummary};
pub use progress::{PipelineProgress, SilentProgress};
