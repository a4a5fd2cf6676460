//! Baseline normalization applied to every draft during assembly.
//!
//! Idempotent by construction: each rule checks its own invariant before
//! rewriting, so a second pass over normalized text changes nothing.

use issuebrief_shared::{AnalysisContext, IssueCategory};

use crate::sections::Draft;

/// One-voice bounds for a routine report, in characters.
const ONE_VOICE_MIN: usize = 20;
const ONE_VOICE_MAX: usize = 100;

/// Canned quotable line per detected sub-domain.
fn canned_one_voice(category: Option<IssueCategory>) -> &'static str {
    match category {
        Some(IssueCategory::Financial) => "확정된 실적은 공시 자료를 통해 투명하게 안내드리겠습니다",
        Some(IssueCategory::ProductQuality) => {
            "품질 관련 사안은 관련 부서 확인을 거쳐 정확하게 설명드리겠습니다"
        }
        Some(IssueCategory::EnvSafety) => {
            "안전과 환경은 최우선 원칙이며 확인된 사실을 기준으로 소통하겠습니다"
        }
        Some(IssueCategory::Operations) | None => {
            "사실 관계를 확인하여 투명하고 성실하게 설명드리겠습니다"
        }
    }
}

/// Apply the routine rules: department `부서명/담당자명` rendering and a
/// quotable one-voice line within bounds.
pub fn apply(draft: &mut Draft, ctx: &AnalysisContext) {
    if draft.opinion_heading.trim().is_empty() {
        draft.opinion_heading = "커뮤니케이션그룹/담당자".into();
    }

    let len = draft.one_voice.chars().count();
    if len < ONE_VOICE_MIN || len > ONE_VOICE_MAX {
        draft.one_voice = canned_one_voice(ctx.initial_analysis.as_ref().map(|a| a.category)).into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuebrief_shared::{IssueInput, ReportMode};

    fn ctx() -> AnalysisContext {
        let input = IssueInput::new("조선일보", "김조선", "가".repeat(40)).unwrap();
        AnalysisContext::new(input, ReportMode::Enhanced)
    }

    #[test]
    fn short_one_voice_is_replaced_with_canned_line() {
        let mut draft = Draft {
            one_voice: "확인 중".into(),
            ..Default::default()
        };
        apply(&mut draft, &ctx());
        let len = draft.one_voice.chars().count();
        assert!((ONE_VOICE_MIN..=ONE_VOICE_MAX).contains(&len));
    }

    #[test]
    fn in_bounds_one_voice_is_left_alone() {
        let line = "사실 관계 확인 후 정확한 내용을 안내드리겠습니다";
        let mut draft = Draft {
            one_voice: line.into(),
            ..Default::default()
        };
        apply(&mut draft, &ctx());
        assert_eq!(draft.one_voice, line);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let mut draft = Draft::default();
        let ctx = ctx();
        apply(&mut draft, &ctx);
        let once = draft.clone();
        apply(&mut draft, &ctx);
        assert_eq!(draft.one_voice, once.one_voice);
        assert_eq!(draft.opinion_heading, once.opinion_heading);
    }

    #[test]
    fn empty_heading_gets_default_desk() {
        let mut draft = Draft::default();
        apply(&mut draft, &ctx());
        assert!(draft.opinion_heading.contains('/'));
    }
}
