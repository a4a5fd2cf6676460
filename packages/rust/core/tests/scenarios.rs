//! End-to-end pipeline runs over deterministic chat and evidence stubs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use issuebrief_core::Pipeline;
use issuebrief_knowledge::KnowledgeStore;
use issuebrief_llm::{ChatBackend, ChatOptions};
use issuebrief_search::EvidenceSource;
use issuebrief_shared::{
    Archetype, BriefError, EvidenceItem, EvidenceSet, PipelineConfig, ReportMode, Result,
    SourceKind,
};

fn knowledge() -> Arc<KnowledgeStore> {
    let dir = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../../data"));
    Arc::new(KnowledgeStore::load(&dir).expect("reference data loads"))
}

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

/// Deterministic chat backend: routes on schema markers in the user prompt.
struct StubChat;

#[async_trait]
impl ChatBackend for StubChat {
    async fn chat(&self, _system: &str, user: &str, _options: &ChatOptions) -> Result<String> {
        let body = if user.contains("\"category\"") {
            let category = if user.contains("실적") {
                "financial"
            } else {
                "operations"
            };
            format!(
                r#"{{"category":"{category}","complexity":"mid","impact_scope":"domestic","urgency":"mid","summary":"문의 요지 요약"}}"#
            )
        } else if user.contains("fact_status") {
            r#"{"fact_status":"probable","credibility":"mid","background":"주관 부서 확인 결과 사실 관계는 대체로 확인됨","cautions":["확정 전 수치 언급 자제"],"similar_cases":"지난해 유사 문의 1건","potential_impact":"보도 시 단기 평판 영향은 제한적","additional_verification_needed":["세부 수치 확인"]}"#
                .to_string()
        } else if user.contains("communication_tone") {
            r#"{"communication_tone":"transparent","key_messages":["정확한 사실 관계를 확인하여 투명하게 설명드리겠습니다","확정된 내용은 공시와 보도자료로 안내드립니다","추가 확인이 필요한 사항은 후속 안내드리겠습니다"],"immediate_actions":["주관 부서 사실 확인","대응 창구 일원화"]}"#
                .to_string()
        } else {
            let names = user
                .lines()
                .find_map(|l| l.strip_prefix("유관 부서: "))
                .unwrap_or_default();
            let entries: Vec<String> = names
                .split(", ")
                .filter(|s| !s.is_empty())
                .map(|n| format!(r#""{n}": {{"opinion":"현황 자료 공유 가능","action":"세부 자료 취합"}}"#))
                .collect();
            format!("{{{}}}", entries.join(","))
        };
        Ok(body)
    }
}

/// Chat backend that always fails upstream.
struct BrokenChat;

#[async_trait]
impl ChatBackend for BrokenChat {
    async fn chat(&self, _system: &str, _user: &str, _options: &ChatOptions) -> Result<String> {
        Err(BriefError::Upstream("stub outage".into()))
    }
}

/// Chat backend that never answers within any deadline.
struct SleepyChat;

#[async_trait]
impl ChatBackend for SleepyChat {
    async fn chat(&self, _system: &str, _user: &str, _options: &ChatOptions) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok("{}".into())
    }
}

struct StubEvidence {
    items: Vec<EvidenceItem>,
    quota: bool,
}

impl StubEvidence {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            quota: false,
        }
    }

    fn quota_exhausted() -> Self {
        Self {
            items: Vec::new(),
            quota: true,
        }
    }

    fn with_news() -> Self {
        Self {
            items: vec![EvidenceItem {
                source_kind: SourceKind::News,
                title: "포스코인터내셔널 2분기 실적 발표".into(),
                url: "https://news.example.com/earnings".into(),
                description: "2분기 연결기준 실적을 발표했다".into(),
                published_at: None,
                relevance_score: 7.0,
            }],
            quota: false,
        }
    }
}

#[async_trait]
impl EvidenceSource for StubEvidence {
    async fn search(&self, _issue_text: &str, limit: usize) -> EvidenceSet {
        EvidenceSet {
            items: self.items.iter().take(limit).cloned().collect(),
            quota_exceeded: self.quota,
        }
    }
}

fn pipeline(chat: Arc<dyn ChatBackend>, evidence: Arc<dyn EvidenceSource>) -> Pipeline {
    Pipeline::new(knowledge(), chat, evidence, PipelineConfig::default())
}

fn assert_six_headers(report: &str) {
    let headers = ["\n1. ", "\n2. ", "\n3. ", "\n4. ", "\n5. ", "\n6. "];
    let mut last = 0;
    for header in headers {
        assert_eq!(report.matches(header).count(), 1, "header {header:?}");
        let pos = report.find(header).unwrap();
        assert!(pos >= last, "header {header:?} out of order");
        last = pos;
    }
}

fn one_voice_of(report: &str) -> String {
    let line = report
        .lines()
        .find(|l| l.starts_with("- 원보이스:"))
        .expect("one-voice line present");
    line.trim_start_matches("- 원보이스:")
        .trim()
        .trim_matches('"')
        .to_string()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn routine_inquiry() {
    let p = pipeline(Arc::new(StubChat), Arc::new(StubEvidence::with_news()));
    let outcome = p
        .generate_report(
            "조선일보",
            "김조선",
            "포스코인터내셔널 식량사업 생산지, 주요 납품처, 올해 매출 계획 관련 문의",
            ReportMode::Enhanced,
        )
        .await
        .unwrap();

    assert_six_headers(&outcome.report);
    assert_eq!(outcome.summary.crisis_level.as_u8(), 1);
    assert_eq!(outcome.summary.departments[0], "식량사업부");
    assert!(outcome.summary.outlet_known);

    let voice = one_voice_of(&outcome.report);
    let len = voice.chars().count();
    assert!((20..=100).contains(&len), "one-voice length {len}");

    let date_line = outcome
        .report
        .lines()
        .find(|l| l.starts_with("1. 발생 일시: "))
        .unwrap();
    let value = date_line.trim_start_matches("1. 발생 일시: ");
    NaiveDateTime::parse_from_str(value, "%Y. %m. %d. %H:%M").expect("date format");
}

#[tokio::test]
async fn financial_disclosure() {
    let p = pipeline(Arc::new(StubChat), Arc::new(StubEvidence::with_news()));
    let outcome = p
        .generate_report(
            "조선일보",
            "김조선",
            "2025년 2분기 포스코인터내셔널 주요사업별 실적과 향후 계획 관련 문의",
            ReportMode::Enhanced,
        )
        .await
        .unwrap();

    assert_six_headers(&outcome.report);
    assert_eq!(outcome.summary.crisis_level.as_u8(), 1);
    assert_eq!(outcome.summary.archetype, Archetype::Financial);
    assert!(outcome.report.contains("IR그룹"));

    for figure in ["8조 1,440억", "3,137억", "905억", "-1.7%", "-10.3%", "-52.3%"] {
        assert!(outcome.report.contains(figure), "missing figure {figure}");
    }
    let segments = ["철강", "에너지", "식량"];
    let present = segments
        .iter()
        .filter(|s| outcome.report.contains(**s))
        .count();
    assert!(present >= 2);
}

#[tokio::test]
async fn high_risk_crisis() {
    let p = pipeline(Arc::new(StubChat), Arc::new(StubEvidence::empty()));
    let outcome = p
        .generate_report(
            "동아일보",
            "김동아",
            "미얀마 가스전 실적 개선 배경, 4단계 개발 진척, 군부 관계, 영업이익 지원금 의혹 해명 요구",
            ReportMode::Enhanced,
        )
        .await
        .unwrap();

    assert_six_headers(&outcome.report);
    assert_eq!(outcome.summary.crisis_level.as_u8(), 3);
    assert_eq!(outcome.summary.archetype, Archetype::Crisis);
    assert!(outcome.report.contains("2. 대응 단계:"));

    let terms = ["PSC", "UJV", "EPC", "MOGE", "OFAC", "HRDD"];
    let hits = terms.iter().filter(|t| outcome.report.contains(**t)).count();
    assert!(hits >= 3, "only {hits} specialist terms");

    assert!(outcome.report.contains("법무그룹"));
    assert!(outcome.report.contains("에너지사업부"));
    assert!(outcome.report.matches("직통 02-759-").count() >= 2);
    assert!(outcome.report.contains("[예상 Q&A]"));

    let voice = one_voice_of(&outcome.report);
    assert!(voice.chars().count() > 100);
}

#[tokio::test]
async fn unknown_outlet_falls_back_to_defaults() {
    let p = pipeline(Arc::new(StubChat), Arc::new(StubEvidence::empty()));
    let outcome = p
        .generate_report(
            "가상일보",
            "홍길동",
            "귀사 현안에 대해 일반적인 내용 중심으로 간단히 여쭙고자 연락드립니다",
            ReportMode::Enhanced,
        )
        .await
        .unwrap();

    assert_six_headers(&outcome.report);
    assert!(outcome.report.contains("(가상일보 홍길동)"));
    assert!(!outcome.summary.outlet_known);
    assert!(outcome.summary.used_default_departments);
    assert_eq!(outcome.summary.departments.len(), 3);
}

#[tokio::test]
async fn search_quota_exhausted() {
    let p = pipeline(Arc::new(StubChat), Arc::new(StubEvidence::quota_exhausted()));
    let outcome = p
        .generate_report(
            "조선일보",
            "김조선",
            "포스코인터내셔널 식량사업 생산지, 주요 납품처, 올해 매출 계획 관련 문의",
            ReportMode::Enhanced,
        )
        .await
        .unwrap();

    assert!(outcome.summary.quota_exceeded);
    assert!(outcome.report.contains("관련 보도사례 조사 중"));
    assert!(outcome.report.contains("일부 외부 데이터 수집이 제한되었습니다"));
}

#[tokio::test(start_paused = true)]
async fn deadline_exceeded_still_reports() {
    let p = pipeline(Arc::new(SleepyChat), Arc::new(StubEvidence::empty()));
    let outcome = p
        .generate_report(
            "조선일보",
            "김조선",
            "귀사 현안에 대해 일반적인 내용 중심으로 간단히 여쭙고자 연락드립니다",
            ReportMode::Enhanced,
        )
        .await
        .unwrap();

    assert_six_headers(&outcome.report);
    assert!(outcome.report.contains("관련 부서에서 사실 관계 확인 중"));
    assert!(!outcome.summary.stage_errors.is_empty());
    assert!(outcome
        .summary
        .stage_errors
        .iter()
        .all(|e| e.code == "deadline_exceeded"));
}

#[tokio::test]
async fn llm_outage_uses_fallbacks_everywhere() {
    let p = pipeline(Arc::new(BrokenChat), Arc::new(StubEvidence::empty()));
    let outcome = p
        .generate_report(
            "조선일보",
            "김조선",
            "귀사 현안에 대해 일반적인 내용 중심으로 간단히 여쭙고자 연락드립니다",
            ReportMode::Enhanced,
        )
        .await
        .unwrap();

    assert_six_headers(&outcome.report);
    assert!(outcome.report.contains("관련 부서에서 사실 관계 확인 중"));
    assert!(outcome.summary.stage_errors.len() >= 3);
}

#[tokio::test]
async fn input_boundaries_surface() {
    let p = pipeline(Arc::new(StubChat), Arc::new(StubEvidence::empty()));
    let short = "가".repeat(19);
    let err = p
        .generate_report("조선일보", "김조선", &short, ReportMode::Enhanced)
        .await
        .unwrap_err();
    assert!(matches!(err, BriefError::Input { .. }));

    let long = "가".repeat(2001);
    let err = p
        .generate_report("조선일보", "김조선", &long, ReportMode::Enhanced)
        .await
        .unwrap_err();
    assert!(matches!(err, BriefError::Input { .. }));
}

#[tokio::test]
async fn repeat_run_identical_except_timestamp() {
    let p = pipeline(Arc::new(StubChat), Arc::new(StubEvidence::with_news()));
    let issue = "포스코인터내셔널 식량사업 생산지, 주요 납품처, 올해 매출 계획 관련 문의";

    let a = p
        .generate_report("조선일보", "김조선", issue, ReportMode::Enhanced)
        .await
        .unwrap();
    let b = p
        .generate_report("조선일보", "김조선", issue, ReportMode::Enhanced)
        .await
        .unwrap();

    let lines_a: Vec<&str> = a.report.lines().collect();
    let lines_b: Vec<&str> = b.report.lines().collect();
    assert_eq!(lines_a.len(), lines_b.len());
    for (la, lb) in lines_a.iter().zip(&lines_b) {
        if la.starts_with("1. 발생 일시:") {
            continue;
        }
        assert_eq!(la, lb);
    }
}
