//! Stage 8: bind the run context into a [`Draft`].

use chrono::{DateTime, Local};

use issuebrief_shared::{AnalysisContext, IssueCategory, Tone};

use crate::sections::{Draft, PLACEHOLDER};

/// Section-1 timestamp format.
pub const DATE_FORMAT: &str = "%Y. %m. %d. %H:%M";

/// Bind one `{{NAME}}` placeholder; empty values become the placeholder
/// string rather than vanishing.
fn bind(template: &str, name: &str, value: &str) -> String {
    let token = format!("{{{{{name}}}}}");
    let value = if value.trim().is_empty() {
        PLACEHOLDER
    } else {
        value
    };
    template.replace(&token, value)
}

fn category_label(category: IssueCategory) -> &'static str {
    match category {
        IssueCategory::ProductQuality => "제품/품질",
        IssueCategory::EnvSafety => "환경/안전",
        IssueCategory::Financial => "재무/실적",
        IssueCategory::Operations => "경영 일반",
    }
}

fn tone_label(tone: Tone) -> &'static str {
    match tone {
        Tone::Cautious => "신중",
        Tone::Transparent => "투명",
        Tone::Proactive => "선제적",
    }
}

/// Render the skeleton and populate every section from the context.
pub fn assemble(ctx: &AnalysisContext, skeleton: &str, now: DateTime<Local>) -> Draft {
    let mut draft = Draft::default();

    draft.occurred_at = now.format(DATE_FORMAT).to_string();
    draft.stage_value = ctx.crisis_level.to_string();

    // Section 3: skeleton first, then the analysis summary.
    let bound = bind(skeleton, "MEDIA_OUTLET", &ctx.input.outlet);
    let bound = bind(&bound, "REPORTER_NAME", &ctx.input.reporter);
    let bound = bind(&bound, "ISSUE", &ctx.input.issue_text);
    draft.content = bound
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    if let Some(analysis) = &ctx.initial_analysis {
        draft.content.push(format!("- 요약: {}", analysis.summary));
    }

    // Section 4.
    draft.opinion_heading = ctx
        .departments
        .iter()
        .map(|m| format!("{}/{}", m.department.name, m.department.owner))
        .collect::<Vec<_>>()
        .join(", ");

    if let Some(fact) = &ctx.fact_check {
        draft.fact_confirmation = fact.background.clone();
        if !fact.potential_impact.is_empty() {
            draft
                .explanation
                .push(format!("예상 영향: {}", fact.potential_impact));
        }
    }
    for (name, opinion) in &ctx.dept_opinions {
        draft
            .explanation
            .push(format!("[{name}] {} (조치: {})", opinion.opinion, opinion.action));
    }

    // Section 5.
    if let Some(strategy) = &ctx.pr_strategy {
        draft.message_direction = format!(
            "{} 기조, {}",
            tone_label(strategy.communication_tone),
            strategy.key_messages.join(" / ")
        );
        if let Some(first) = strategy.key_messages.first() {
            draft.one_voice = first.clone();
        }
        draft.follow_ups = strategy.immediate_actions.clone();
    }

    // Reference block.
    if ctx.evidence.items.is_empty() {
        draft.similar_cases.push("관련 보도사례 조사 중".into());
    } else {
        for item in ctx.evidence.items.iter().take(3) {
            draft
                .similar_cases
                .push(format!("{} ({})", item.title, item.url));
        }
    }
    if let Some(fact) = &ctx.fact_check {
        if !fact.similar_cases.is_empty() {
            draft.similar_cases.push(fact.similar_cases.clone());
        }
        for caution in &fact.cautions {
            draft.concept_notes.push(caution.clone());
        }
    }
    if let Some(analysis) = &ctx.initial_analysis {
        draft
            .concept_notes
            .push(format!("이슈 분류: {} 영역", category_label(analysis.category)));
    }

    draft
}
