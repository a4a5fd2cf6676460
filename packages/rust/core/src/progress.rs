//! Progress reporting seam for pipeline runs.

use issuebrief_shared::Stage;

use crate::pipeline::RunSummary;

/// Callbacks emitted as a run advances. All methods default to no-ops so
/// implementors only override what they render.
pub trait PipelineProgress: Send + Sync {
    fn stage_started(&self, _stage: Stage) {}
    fn finished(&self, _summary: &RunSummary) {}
}

/// Reporter that renders nothing; the default for library consumers.
pub struct SilentProgress;

impl PipelineProgress for SilentProgress {}
