//! Report assembly and archetype-keyed enhancement.
//!
//! Stage 8 of the pipeline: the orchestrator hands over a finished
//! [`AnalysisContext`] and the loaded skeleton, and gets back the final
//! UTF-8 report. Everything in here is synchronous and pure over its inputs.

pub mod assembly;
pub mod enhancers;
pub mod figures;
pub mod roster;
pub mod sections;

use chrono::{DateTime, Local};

use issuebrief_shared::{AnalysisContext, Archetype, CrisisLevel, ReportMode};

pub use enhancers::select_archetype;
pub use sections::{Draft, PLACEHOLDER};

/// Quota footnote, present whenever any external source reported 429.
pub const QUOTA_FOOTNOTE: &str = "※ 일부 외부 데이터 수집이 제한되었습니다";

/// Compose the final report: assemble, normalize, run at most one
/// specialist enhancer (enhanced mode only), render. The returned level is
/// the one the report displays, which the crisis re-scan may have raised
/// above the context's.
pub fn compose(
    ctx: &AnalysisContext,
    skeleton: &str,
    now: DateTime<Local>,
) -> (String, Archetype, CrisisLevel) {
    let mut draft = assembly::assemble(ctx, skeleton, now);
    enhancers::routine::apply(&mut draft, ctx);

    let archetype = select_archetype(ctx);
    let crisis_level = if ctx.mode == ReportMode::Enhanced {
        enhancers::apply(archetype, &mut draft, ctx)
    } else {
        ctx.crisis_level
    };

    if ctx.quota_exceeded() {
        draft.footnote = Some(QUOTA_FOOTNOTE.into());
    }

    (draft.render(), archetype, crisis_level)
}
