//! Core domain types for the issue report pipeline.
//!
//! One pipeline run owns exactly one [`AnalysisContext`]; helpers are pure
//! functions over `(&mut context, inputs)` and nothing outlives the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BriefError, Result};

/// Minimum accepted issue text length, in characters.
pub const MIN_ISSUE_CHARS: usize = 20;
/// Maximum accepted issue text length, in characters.
pub const MAX_ISSUE_CHARS: usize = 2_000;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for pipeline run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// IssueInput
// ---------------------------------------------------------------------------

/// The raw press inquiry: outlet, reporter, and free-text issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueInput {
    /// Media outlet name as given by the caller.
    pub outlet: String,
    /// Reporter name as given by the caller.
    pub reporter: String,
    /// Free-text description of the inquiry, 20–2000 characters.
    pub issue_text: String,
}

impl IssueInput {
    /// Build a validated input: trims whitespace, rejects empty fields and
    /// issue text outside `[MIN_ISSUE_CHARS, MAX_ISSUE_CHARS]` characters.
    pub fn new(
        outlet: impl Into<String>,
        reporter: impl Into<String>,
        issue_text: impl Into<String>,
    ) -> Result<Self> {
        let outlet = outlet.into().trim().to_string();
        let reporter = reporter.into().trim().to_string();
        let issue_text = issue_text.into().trim().to_string();

        if outlet.is_empty() {
            return Err(BriefError::input("outlet must not be empty"));
        }
        if reporter.is_empty() {
            return Err(BriefError::input("reporter must not be empty"));
        }

        let len = issue_text.chars().count();
        if len < MIN_ISSUE_CHARS || len > MAX_ISSUE_CHARS {
            return Err(BriefError::input(format!(
                "issue text must be {MIN_ISSUE_CHARS}–{MAX_ISSUE_CHARS} characters, got {len}"
            )));
        }

        Ok(Self {
            outlet,
            reporter,
            issue_text,
        })
    }
}

// ---------------------------------------------------------------------------
// Crisis level
// ---------------------------------------------------------------------------

/// Crisis level 1–4. Never reduced by later stages; enhancers may raise it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CrisisLevel {
    /// Level 1 — 관심.
    Attention,
    /// Level 2 — 주의.
    Caution,
    /// Level 3 — 위기.
    Crisis,
    /// Level 4 — 비상.
    Emergency,
}

impl CrisisLevel {
    /// Numeric level, 1–4.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Attention => 1,
            Self::Caution => 2,
            Self::Crisis => 3,
            Self::Emergency => 4,
        }
    }

    /// Korean label for the level.
    pub fn label(self) -> &'static str {
        match self {
            Self::Attention => "관심",
            Self::Caution => "주의",
            Self::Crisis => "위기",
            Self::Emergency => "비상",
        }
    }

    /// Build from a numeric level, clamping into 1–4.
    pub fn from_score(level: u8) -> Self {
        match level {
            0 | 1 => Self::Attention,
            2 => Self::Caution,
            3 => Self::Crisis,
            _ => Self::Emergency,
        }
    }
}

impl TryFrom<u8> for CrisisLevel {
    type Error = String;

    fn try_from(v: u8) -> std::result::Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Attention),
            2 => Ok(Self::Caution),
            3 => Ok(Self::Crisis),
            4 => Ok(Self::Emergency),
            other => Err(format!("crisis level must be 1–4, got {other}")),
        }
    }
}

impl From<CrisisLevel> for u8 {
    fn from(level: CrisisLevel) -> u8 {
        level.as_u8()
    }
}

impl std::fmt::Display for CrisisLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.as_u8(), self.label())
    }
}

// ---------------------------------------------------------------------------
// Reference records (loaded by the knowledge store, read-only at runtime)
// ---------------------------------------------------------------------------

/// A reporter attached to an outlet's desk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutletReporter {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// A media outlet record from the reference directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Outlet {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub main_phone: String,
    #[serde(default)]
    pub fax: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub desk: Vec<String>,
    #[serde(default)]
    pub reporters: Vec<OutletReporter>,
}

impl Outlet {
    /// Minimal stub used when the outlet is unknown to the reference data.
    pub fn stub(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// An internal department record from the reference directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub contacts: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub owned_issues: Vec<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A department with its relevance score for the current issue.
#[derive(Debug, Clone)]
pub struct DepartmentMatch {
    pub department: Department,
    pub score: f64,
    pub matched_terms: Vec<String>,
}

/// One entry of the crisis rubric (per level).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisRubricEntry {
    pub label: String,
    #[serde(default)]
    pub response_org: String,
    #[serde(default)]
    pub reporting_line: String,
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// Where an evidence item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    News,
    OfficialSite,
    RegulatorFiling,
    ExchangeDisclosure,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::OfficialSite => "official_site",
            Self::RegulatorFiling => "regulator_filing",
            Self::ExchangeDisclosure => "exchange_disclosure",
        }
    }
}

/// An externally sourced record used to ground fact synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source_kind: SourceKind,
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub relevance_score: f64,
}

/// Evidence gathered for one run. `quota_exceeded` is set when any source
/// hit HTTP 429; the run continues with whatever was obtained.
#[derive(Debug, Clone, Default)]
pub struct EvidenceSet {
    pub items: Vec<EvidenceItem>,
    pub quota_exceeded: bool,
}

// ---------------------------------------------------------------------------
// LLM stage outputs
// ---------------------------------------------------------------------------

/// Issue category from the initial analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    ProductQuality,
    EnvSafety,
    Financial,
    Operations,
}

/// Three-point scale shared by complexity and urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Low,
    Mid,
    High,
}

/// Geographic reach of the issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactScope {
    Global,
    Domestic,
    Local,
}

/// Stage-2 output: the LLM's first read of the issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialAnalysis {
    pub category: IssueCategory,
    pub complexity: Scale,
    pub impact_scope: ImpactScope,
    pub urgency: Scale,
    pub summary: String,
}

impl InitialAnalysis {
    /// Defaults object substituted on parse failure: summary is the first
    /// 50 characters of the issue text.
    pub fn fallback(issue_text: &str) -> Self {
        Self {
            category: IssueCategory::Operations,
            complexity: Scale::Mid,
            impact_scope: ImpactScope::Domestic,
            urgency: Scale::Mid,
            summary: issue_text.chars().take(50).collect(),
        }
    }
}

/// Fact-check verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactStatus {
    Confirmed,
    Probable,
    Unverifiable,
}

/// Stage-5 output: structured fact synthesis over the gathered evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheck {
    pub fact_status: FactStatus,
    pub credibility: Scale,
    pub background: String,
    #[serde(default)]
    pub cautions: Vec<String>,
    #[serde(default)]
    pub similar_cases: String,
    #[serde(default)]
    pub potential_impact: String,
    #[serde(default)]
    pub additional_verification_needed: Vec<String>,
}

impl FactCheck {
    /// Canned fallback when the LLM stage fails.
    pub fn fallback() -> Self {
        Self {
            fact_status: FactStatus::Unverifiable,
            credibility: Scale::Low,
            background: "관련 부서에서 사실 관계 확인 중".into(),
            cautions: vec!["확인되지 않은 내용의 외부 공유 자제".into()],
            similar_cases: String::new(),
            potential_impact: String::new(),
            additional_verification_needed: vec!["주관 부서 사실 확인".into()],
        }
    }
}

/// Stage-6 output, per department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeptOpinion {
    pub opinion: String,
    pub action: String,
}

impl DeptOpinion {
    /// Per-department fallback when the batched opinion call fails.
    pub fn fallback() -> Self {
        Self {
            opinion: "검토 중".into(),
            action: "추가 정보 수집".into(),
        }
    }
}

/// Communication tone for the PR strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Cautious,
    Transparent,
    Proactive,
}

/// Stage-7 output: overall PR direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrStrategy {
    pub communication_tone: Tone,
    pub key_messages: Vec<String>,
    pub immediate_actions: Vec<String>,
}

impl PrStrategy {
    /// Fallback strategy: at least one key message, cautious tone.
    pub fn fallback() -> Self {
        Self {
            communication_tone: Tone::Cautious,
            key_messages: vec!["정확한 사실 확인 후 안내드리겠습니다".into()],
            immediate_actions: vec!["주관 부서 사실 관계 확인".into()],
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline configuration & observability
// ---------------------------------------------------------------------------

/// Pipeline mode: `standard` skips specialist enhancers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    Standard,
    #[default]
    Enhanced,
}

impl std::str::FromStr for ReportMode {
    type Err = BriefError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" => Ok(Self::Standard),
            "enhanced" => Ok(Self::Enhanced),
            other => Err(BriefError::input(format!(
                "mode must be `standard` or `enhanced`, got `{other}`"
            ))),
        }
    }
}

/// Issue archetype, computed after stage 7; selects the post-processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archetype {
    Routine,
    Financial,
    Crisis,
}

/// Pipeline stage identifiers, used for per-stage error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    InitialAnalysis,
    Mapping,
    Evidence,
    FactSynthesis,
    DeptOpinions,
    PrStrategy,
    Assembly,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::InitialAnalysis => "initial_analysis",
            Self::Mapping => "mapping",
            Self::Evidence => "evidence",
            Self::FactSynthesis => "fact_synthesis",
            Self::DeptOpinions => "dept_opinions",
            Self::PrStrategy => "pr_strategy",
            Self::Assembly => "assembly",
        }
    }
}

/// A stage-local failure, recorded for observability but absorbed.
#[derive(Debug, Clone)]
pub struct StageError {
    pub stage: Stage,
    pub code: String,
}

// ---------------------------------------------------------------------------
// AnalysisContext
// ---------------------------------------------------------------------------

/// Mutable state for one pipeline run, owned exclusively by the orchestrator
/// and discarded after report emission.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub run_id: RunId,
    pub input: IssueInput,
    pub mode: ReportMode,
    pub initial_analysis: Option<InitialAnalysis>,
    /// At most 3 departments, sorted by score desc, priority asc, name asc.
    pub departments: Vec<DepartmentMatch>,
    /// True when ranking returned zero hits and the defaults were attached.
    pub used_default_departments: bool,
    pub crisis_level: CrisisLevel,
    pub crisis_signals: Vec<String>,
    pub outlet: Outlet,
    /// False when the outlet was unknown and a stub was substituted.
    pub outlet_known: bool,
    pub evidence: EvidenceSet,
    pub fact_check: Option<FactCheck>,
    /// Opinions keyed by department name, in department order.
    pub dept_opinions: Vec<(String, DeptOpinion)>,
    pub pr_strategy: Option<PrStrategy>,
    pub stage_errors: Vec<StageError>,
}

impl AnalysisContext {
    /// Fresh context for a validated input.
    pub fn new(input: IssueInput, mode: ReportMode) -> Self {
        let outlet = Outlet::stub(&input.outlet);
        Self {
            run_id: RunId::new(),
            input,
            mode,
            initial_analysis: None,
            departments: Vec::new(),
            used_default_departments: false,
            crisis_level: CrisisLevel::Attention,
            crisis_signals: Vec::new(),
            outlet,
            outlet_known: false,
            evidence: EvidenceSet::default(),
            fact_check: None,
            dept_opinions: Vec::new(),
            pr_strategy: None,
            stage_errors: Vec::new(),
        }
    }

    /// Raise the crisis level. Levels are monotone non-decreasing across
    /// stages; lower values are ignored.
    pub fn raise_crisis_level(&mut self, level: CrisisLevel) {
        if level > self.crisis_level {
            self.crisis_level = level;
        }
    }

    /// Record an absorbed stage failure.
    pub fn record_error(&mut self, stage: Stage, code: impl Into<String>) {
        let code = code.into();
        tracing::warn!(stage = stage.as_str(), %code, "stage failure absorbed");
        self.stage_errors.push(StageError { stage, code });
    }

    /// Whether any source reported quota exhaustion.
    pub fn quota_exceeded(&self) -> bool {
        self.evidence.quota_exceeded
    }
}
