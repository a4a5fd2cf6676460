//! Crisis enhancer, applied when the crisis level reaches 3 (위기).
//!
//! Rewrites the draft into response posture: relabels section 2, injects the
//! multi-department contact roster, replaces the explanation chain and one
//! voice, and appends the anticipated Q&A bridge.

use issuebrief_shared::{AnalysisContext, CrisisLevel};
use tracing::info;

use crate::roster;
use crate::sections::Draft;

/// Wording that routes the issue to the energy sub-domain playbook.
const ENERGY_MARKERS: &[&str] = &["가스전", "미얀마", "에너지", "LNG", "광구"];

fn is_energy(issue_text: &str) -> bool {
    ENERGY_MARKERS.iter().any(|m| issue_text.contains(m))
}

/// Explanation chain: political separation, sanctions compliance, internal
/// controls, contractual non-disclosure. Energy variant names the contract
/// structures a specialist desk will be asked about.
fn explanation_chain(energy: bool) -> Vec<String> {
    if energy {
        vec![
            "당사는 특정 정치 세력과 무관한 상업적 계약 주체로서 사업을 수행하고 있음".into(),
            "PSC(생산물분배계약) 및 UJV(비법인 합작) 구조상 대금 정산은 계약 절차를 따름".into(),
            "OFAC 등 국제 제재 준수 여부를 상시 점검하고 HRDD(인권 실사)를 정기 수행함".into(),
            "EPC 일정 등 세부 계약 조건은 비밀유지 조항에 따라 공개 불가".into(),
        ]
    } else {
        vec![
            "당사는 특정 정치 세력 및 이해관계자와 무관하게 사업을 수행하고 있음".into(),
            "국내외 제재 및 관련 법규 준수 여부를 상시 점검하고 있음".into(),
            "내부 통제 및 감사 절차에 따라 사실 관계를 확인 중임".into(),
            "계약상 비밀유지 사항은 공개가 제한됨".into(),
        ]
    }
}

/// Four-sentence structured one-voice message, always over 100 characters.
fn one_voice(energy: bool) -> String {
    if energy {
        "당사는 해당 사업을 국제 제재와 관련 법규를 철저히 준수하며 운영하고 있습니다. \
         사업 대금은 계약 구조에 따라 투명하게 정산되고 있습니다. \
         정치적 상황과 무관하게 현지 주민의 안전과 인권 보호를 최우선으로 하고 있습니다. \
         구체적인 계약 조건은 비밀유지 의무에 따라 공개가 제한됨을 양해 부탁드립니다."
            .into()
    } else {
        "당사는 제기된 사안에 대해 관련 법규와 내부 통제 기준을 철저히 준수하고 있습니다. \
         현재 사실 관계를 신속하고 면밀하게 확인하고 있습니다. \
         확인된 내용은 절차에 따라 투명하게 소통하겠습니다. \
         계약상 비밀유지 사항은 공개가 제한됨을 양해 부탁드립니다."
            .into()
    }
}

fn qa_bridge(energy: bool) -> Vec<String> {
    let mut lines = vec!["[예상 Q&A]".to_string()];
    if energy {
        lines.extend([
            "Q. 군부 또는 MOGE(미얀마국영석유가스회사)로의 자금 유입 가능성은?".into(),
            "A. 대금 정산은 PSC 계약 절차를 따르며, OFAC 제재 준수 여부를 상시 점검하고 있습니다.".into(),
            "Q. 4단계 개발(EPC) 일정과 투자 규모는?".into(),
            "A. UJV 참여사 간 협의 사항으로, 확정 전 세부 내용은 공개가 제한됩니다.".into(),
            "Q. 인권 침해 우려에 대한 대응은?".into(),
            "A. HRDD(인권 실사)를 정기 수행하며 결과에 따라 필요한 조치를 취하고 있습니다.".into(),
        ]);
    } else {
        lines.extend([
            "Q. 제기된 의혹을 인정하는 것인가?".into(),
            "A. 현재 사실 관계를 확인 중이며, 확인된 내용만 말씀드릴 수 있습니다.".into(),
            "Q. 내부 조사 결과는 언제 나오는가?".into(),
            "A. 절차에 따라 진행 중이며, 공개 가능한 시점에 안내드리겠습니다.".into(),
        ]);
    }
    lines
}

/// Apply the crisis rules. Re-scans the issue text and may raise the
/// displayed level above what stage 3 computed, never lower it. Returns
/// the level the report actually shows.
pub fn apply(draft: &mut Draft, ctx: &AnalysisContext) -> CrisisLevel {
    let (rescanned, _) = issuebrief_knowledge::crisis::assess(&ctx.input.issue_text);
    let level = rescanned.max(ctx.crisis_level);
    if level > ctx.crisis_level {
        info!(from = ctx.crisis_level.as_u8(), to = level.as_u8(), "crisis re-scan raised level");
    }

    let energy = is_energy(&ctx.input.issue_text);

    draft.stage_heading = "대응 단계".into();
    draft.stage_value = level.to_string();
    draft.explanation = explanation_chain(energy);
    draft.one_voice = one_voice(energy);
    draft.qa_bridge = qa_bridge(energy);

    draft.contact_block.clear();
    draft.contact_block.push("- 비상 연락망:".into());
    for contact in roster::crisis_contacts(energy) {
        draft.contact_block.push(contact.as_line());
    }

    level
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuebrief_shared::{IssueInput, ReportMode};

    fn ctx(issue: &str, level: CrisisLevel) -> AnalysisContext {
        let input = IssueInput::new("동아일보", "김동아", issue.to_string()).unwrap();
        let mut ctx = AnalysisContext::new(input, ReportMode::Enhanced);
        ctx.raise_crisis_level(level);
        ctx
    }

    #[test]
    fn relabels_section_two_and_keeps_level() {
        let ctx = ctx(
            "미얀마 가스전 군부 관계 및 영업이익 지원금 의혹 해명 요구",
            CrisisLevel::Crisis,
        );
        let mut draft = Draft::default();
        apply(&mut draft, &ctx);
        assert_eq!(draft.stage_heading, "대응 단계");
        assert_eq!(draft.stage_value, "3(위기)");
    }

    #[test]
    fn rescan_raises_but_never_lowers() {
        // tier-4 keyword in the text, stage 3 only saw level 3
        let ctx = ctx(
            "본사 압수수색 및 미얀마 가스전 비자금 의혹 관련 해명 요구",
            CrisisLevel::Crisis,
        );
        let mut draft = Draft::default();
        let level = apply(&mut draft, &ctx);
        assert_eq!(level, CrisisLevel::Emergency);
        assert_eq!(draft.stage_value, "4(비상)");
    }

    #[test]
    fn energy_issue_gets_specialist_terms_and_energy_desk() {
        let ctx = ctx(
            "미얀마 가스전 4단계 개발 진척 및 군부 관계 의혹 해명 요구",
            CrisisLevel::Crisis,
        );
        let mut draft = Draft::default();
        apply(&mut draft, &ctx);
        let rendered = draft.render();

        let terms = ["PSC", "UJV", "EPC", "MOGE", "OFAC", "HRDD"];
        let hits = terms.iter().filter(|t| rendered.contains(**t)).count();
        assert!(hits >= 3, "only {hits} specialist terms present");
        assert!(rendered.contains("에너지사업부"));
        assert!(rendered.contains("법무그룹"));
        assert!(rendered.contains("02-759-"));
    }

    #[test]
    fn one_voice_is_long_multi_sentence() {
        let ctx = ctx(
            "미얀마 가스전 군부 관계 의혹에 대한 해명을 요구합니다",
            CrisisLevel::Crisis,
        );
        let mut draft = Draft::default();
        apply(&mut draft, &ctx);
        assert!(draft.one_voice.chars().count() > 100);
        assert!(draft.one_voice.matches("니다.").count() >= 4);
    }

    #[test]
    fn generic_crisis_gets_qa_bridge_too() {
        let ctx = ctx(
            "협력사 대상 불공정 계약 강요 의혹 고발 건 관련 해명 요구",
            CrisisLevel::Crisis,
        );
        let mut draft = Draft::default();
        apply(&mut draft, &ctx);
        assert!(draft.qa_bridge.iter().any(|l| l.starts_with("Q.")));
        assert!(!draft.contact_block.iter().any(|l| l.contains("에너지사업부")));
    }
}
