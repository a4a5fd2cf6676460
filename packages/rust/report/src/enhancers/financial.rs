//! Financial enhancer, applied to financial-reporting inquiries at crisis
//! level 2 or below. Attaches the IR desk, injects canned period figures,
//! and normalizes diction to IR wording.

use issuebrief_shared::AnalysisContext;

use crate::figures;
use crate::roster;
use crate::sections::Draft;

/// Rewrite `매출` into IR wording where the IR phrasing is not already
/// present. Idempotent: already-qualified occurrences are left alone.
fn ir_diction(text: &str) -> String {
    const SENTINEL: &str = "\u{1}";
    text.replace("연결기준 매출", SENTINEL)
        .replace("매출", "연결기준 매출")
        .replace(SENTINEL, "연결기준 매출")
}

pub fn apply(draft: &mut Draft, ctx: &AnalysisContext) {
    let figures = figures::for_issue(&ctx.input.issue_text);

    // IR group owns the report if ranking did not already attach it.
    let ir = roster::IR;
    if !draft.opinion_heading.contains(ir.department) {
        let entry = format!("{}/{}", ir.department, ir.owner);
        if draft.opinion_heading.trim().is_empty() {
            draft.opinion_heading = entry;
        } else {
            draft.opinion_heading = format!("{entry}, {}", draft.opinion_heading);
        }
    }
    if !draft.contact_block.iter().any(|l| l.contains(ir.department)) {
        draft.contact_block.push(format!("- IR 문의: {}", ir.as_line().trim_start()));
    }

    // Canned figures replace whatever the fact-check produced.
    draft.fact_confirmation = format!(
        "{} 연결기준 매출 {} (전년 동기 대비 {}), 영업이익 {} ({}), 순이익 {} ({})",
        figures.period,
        figures.revenue,
        figures.revenue_yoy,
        figures.operating_profit,
        figures.operating_profit_yoy,
        figures.net_profit,
        figures.net_profit_yoy,
    );

    draft.explanation = figures
        .segments
        .iter()
        .map(|s| format!("[{}] {}", s.name, s.commentary))
        .collect();
    if figures.has_negative_delta() {
        draft.explanation.push(
            "영업이익과 순이익은 전년 동기 대비 감소했으나, 철강 트레이딩 물량과 식량 취급량 등 \
             외형 지표는 개선 흐름을 유지함"
                .into(),
        );
    }

    draft.message_direction = ir_diction(&draft.message_direction);
    for line in &mut draft.content {
        *line = ir_diction(line);
    }
}
