//! Archetype-keyed post-processors over the rendered draft.
//!
//! At most one specialist enhancer runs per report. Each is a pure function
//! `(draft, context) -> ()` mutating sections in place; the six-section
//! structure is never added to or removed from.

pub mod crisis;
pub mod financial;
pub mod routine;

use issuebrief_shared::{AnalysisContext, Archetype, CrisisLevel};

use crate::sections::Draft;

/// Wording that marks a financial-reporting inquiry.
const FINANCIAL_KEYWORDS: &[&str] = &[
    "실적", "매출", "영업이익", "순이익", "분기", "재무", "공시", "결산",
];

fn is_financial(issue_text: &str) -> bool {
    FINANCIAL_KEYWORDS.iter().any(|k| issue_text.contains(k))
}

/// Pick the post-processor: crisis wins over financial, financial over
/// routine. Routine is not a specialist pass; it runs during assembly.
pub fn select_archetype(ctx: &AnalysisContext) -> Archetype {
    if ctx.crisis_level >= CrisisLevel::Crisis {
        Archetype::Crisis
    } else if is_financial(&ctx.input.issue_text) {
        Archetype::Financial
    } else {
        Archetype::Routine
    }
}

/// Run the selected enhancer and return the level the report displays.
/// Only the crisis pass may raise it; `Routine` is a no-op here.
pub fn apply(archetype: Archetype, draft: &mut Draft, ctx: &AnalysisContext) -> CrisisLevel {
    match archetype {
        Archetype::Crisis => crisis::apply(draft, ctx),
        Archetype::Financial => {
            financial::apply(draft, ctx);
            ctx.crisis_level
        }
        Archetype::Routine => ctx.crisis_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuebrief_shared::{IssueInput, ReportMode};

    fn ctx(issue: &str) -> AnalysisContext {
        let input = IssueInput::new("조선일보", "김조선", issue.to_string()).unwrap();
        AnalysisContext::new(input, ReportMode::Enhanced)
    }

    #[test]
    fn crisis_level_dominates_financial_keywords() {
        let mut ctx = ctx("미얀마 가스전 영업이익 지원금 의혹 해명 요구 관련 문의");
        ctx.raise_crisis_level(CrisisLevel::Crisis);
        assert_eq!(select_archetype(&ctx), Archetype::Crisis);
    }

    #[test]
    fn financial_keywords_select_financial() {
        let ctx = ctx("2025년 2분기 주요사업별 실적과 향후 계획 관련 문의");
        assert_eq!(select_archetype(&ctx), Archetype::Financial);
    }

    #[test]
    fn plain_inquiry_is_routine() {
        let ctx = ctx("식량사업 생산지와 주요 납품처 현황 일반 문의입니다");
        assert_eq!(select_archetype(&ctx), Archetype::Routine);
    }
}
