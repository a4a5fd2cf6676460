//! Prompt builders for the four LLM stages.
//!
//! Every builder returns a `(system, user)` pair. Stages that demand JSON
//! say so explicitly and enumerate the allowed values; the client parses
//! strictly and the orchestrator falls back on any deviation.

use issuebrief_shared::{EvidenceItem, FactCheck, InitialAnalysis, IssueInput};

/// Evidence excerpts passed to fact synthesis, at most this many items.
const MAX_EVIDENCE_EXCERPTS: usize = 5;

/// Description excerpt length per evidence item, in characters.
const MAX_EXCERPT_CHARS: usize = 120;

const ANALYST_SYSTEM: &str = "당신은 기업 커뮤니케이션팀의 이슈 분석 담당자입니다. \
    요청된 JSON 스키마를 정확히 지키고, JSON 외의 텍스트는 출력하지 마십시오.";

/// Stage 2: first read of the issue.
pub fn initial_analysis(input: &IssueInput) -> (String, String) {
    let user = format!(
        "다음 언론 문의를 분석해 JSON으로만 답하십시오.\n\
         매체: {}\n기자: {}\n문의 내용: {}\n\n\
         스키마:\n\
         {{\n\
           \"category\": \"product-quality\" | \"env-safety\" | \"financial\" | \"operations\",\n\
           \"complexity\": \"low\" | \"mid\" | \"high\",\n\
           \"impact_scope\": \"global\" | \"domestic\" | \"local\",\n\
           \"urgency\": \"low\" | \"mid\" | \"high\",\n\
           \"summary\": \"50자 이내 요약\"\n\
         }}",
        input.outlet, input.reporter, input.issue_text
    );
    (ANALYST_SYSTEM.to_string(), user)
}

/// Stage 5: structured fact synthesis over the gathered evidence.
pub fn fact_synthesis(
    issue_text: &str,
    analysis: &InitialAnalysis,
    evidence: &[EvidenceItem],
) -> (String, String) {
    let excerpts = if evidence.is_empty() {
        "외부 근거 자료 없음".to_string()
    } else {
        evidence
            .iter()
            .take(MAX_EVIDENCE_EXCERPTS)
            .map(|item| {
                format!(
                    "- [{}] {} — {}",
                    item.source_kind.as_str(),
                    item.title,
                    truncate(&item.description, MAX_EXCERPT_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let user = format!(
        "이슈: {issue_text}\n초기 분석 요약: {}\n\n수집된 근거:\n{excerpts}\n\n\
         위 근거를 바탕으로 JSON으로만 답하십시오.\n\
         스키마:\n\
         {{\n\
           \"fact_status\": \"confirmed\" | \"probable\" | \"unverifiable\",\n\
           \"credibility\": \"low\" | \"mid\" | \"high\",\n\
           \"background\": \"150자 이내\",\n\
           \"cautions\": [\"최대 3개\"],\n\
           \"similar_cases\": \"100자 이내\",\n\
           \"potential_impact\": \"200자 이내\",\n\
           \"additional_verification_needed\": [\"최대 3개\"]\n\
         }}",
        analysis.summary
    );
    (ANALYST_SYSTEM.to_string(), user)
}

/// Stage 6: one batched request covering every relevant department.
pub fn dept_opinions(issue_text: &str, department_names: &[String]) -> (String, String) {
    let depts = department_names.join(", ");
    let user = format!(
        "이슈: {issue_text}\n유관 부서: {depts}\n\n\
         각 부서의 예상 의견을 JSON으로만 답하십시오. 키는 부서명 그대로 사용합니다.\n\
         스키마:\n\
         {{\n\
           \"<부서명>\": {{\"opinion\": \"100자 이내\", \"action\": \"50자 이내\"}}\n\
         }}"
    );
    (ANALYST_SYSTEM.to_string(), user)
}

/// Stage 7: PR strategy for the run.
pub fn pr_strategy(issue_text: &str, fact_check: &FactCheck) -> (String, String) {
    let user = format!(
        "이슈: {issue_text}\n사실 확인 배경: {}\n\n\
         대응 전략을 JSON으로만 답하십시오.\n\
         스키마:\n\
         {{\n\
           \"communication_tone\": \"cautious\" | \"transparent\" | \"proactive\",\n\
           \"key_messages\": [\"정확히 3개, 각 80자 이내\"],\n\
           \"immediate_actions\": [\"정확히 2개, 각 60자 이내\"]\n\
         }}",
        fact_check.background
    );
    (ANALYST_SYSTEM.to_string(), user)
}

/// Truncate to approximately `max_chars` characters.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuebrief_shared::{ImpactScope, IssueCategory, Scale, SourceKind};

    fn analysis() -> InitialAnalysis {
        InitialAnalysis {
            category: IssueCategory::Financial,
            complexity: Scale::Mid,
            impact_scope: ImpactScope::Domestic,
            urgency: Scale::Mid,
            summary: "2분기 실적 문의".into(),
        }
    }

    #[test]
    fn initial_analysis_lists_allowed_values() {
        let input = IssueInput::new("조선일보", "김조선", "가".repeat(30)).unwrap();
        let (system, user) = initial_analysis(&input);
        assert!(system.contains("JSON"));
        assert!(user.contains("product-quality"));
        assert!(user.contains("조선일보"));
    }

    #[test]
    fn fact_synthesis_includes_evidence_excerpts() {
        let evidence = vec![EvidenceItem {
            source_kind: SourceKind::News,
            title: "미얀마 가스전 보도".into(),
            url: "https://news.example.com/a".into(),
            description: "본문 요약".into(),
            published_at: None,
            relevance_score: 5.0,
        }];
        let (_, user) = fact_synthesis("이슈 본문", &analysis(), &evidence);
        assert!(user.contains("미얀마 가스전 보도"));
        assert!(user.contains("fact_status"));
    }

    #[test]
    fn fact_synthesis_without_evidence_says_so() {
        let (_, user) = fact_synthesis("이슈 본문", &analysis(), &[]);
        assert!(user.contains("외부 근거 자료 없음"));
    }

    #[test]
    fn dept_opinions_names_every_department() {
        let names = vec!["식량사업부".to_string(), "IR그룹".to_string()];
        let (_, user) = dept_opinions("이슈 본문", &names);
        assert!(user.contains("식량사업부"));
        assert!(user.contains("IR그룹"));
        assert!(user.contains("opinion"));
    }

    #[test]
    fn truncate_caps_by_characters() {
        let long = "가".repeat(200);
        let cut = truncate(&long, 120);
        assert_eq!(cut.chars().count(), 121); // 120 + ellipsis
        assert!(truncate("짧음", 120).eq("짧음"));
    }
}
