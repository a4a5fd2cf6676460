//! The eight-stage run orchestrator.
//!
//! One call to [`Pipeline::generate_report`] owns one [`AnalysisContext`]
//! from validation to rendered report. Every stage after validation absorbs
//! its own failures: the run always reaches assembly and always emits a
//! report, however degraded.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{info, instrument};

use issuebrief_knowledge::{KnowledgeStore, crisis};
use issuebrief_llm::{ChatBackend, ChatOptions, prompts};
use issuebrief_search::EvidenceSource;
use issuebrief_shared::{
    AnalysisContext, Archetype, BriefError, CrisisLevel, DeptOpinion, FactCheck, InitialAnalysis,
    IssueInput, PipelineConfig, PrStrategy, ReportMode, Result, RunId, Stage, StageError,
};

use crate::progress::{PipelineProgress, SilentProgress};

/// What a finished run hands back: the report plus its run summary.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: String,
    pub summary: RunSummary,
}

/// Observability record for one run. Stage errors here were all absorbed;
/// their sections carry fallback text in the report.
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: RunId,
    pub archetype: Archetype,
    /// The level the report displays, including any crisis re-scan raise.
    pub crisis_level: CrisisLevel,
    pub departments: Vec<String>,
    pub used_default_departments: bool,
    pub outlet_known: bool,
    pub evidence_count: usize,
    pub quota_exceeded: bool,
    pub stage_errors: Vec<StageError>,
    pub elapsed_ms: u64,
}

/// Short code recorded per absorbed stage failure.
fn error_code(error: &BriefError) -> &'static str {
    match error {
        BriefError::Input { .. } => "input",
        BriefError::Config { .. } => "config",
        BriefError::Upstream(_) | BriefError::UpstreamTerminal(_) => "upstream",
        BriefError::Parse { .. } => "llm_parse",
        BriefError::QuotaExceeded(_) => "quota_exceeded",
        BriefError::DeadlineExceeded { .. } => "deadline_exceeded",
        BriefError::Io { .. } => "io",
    }
}

/// Pipeline orchestrator. Cheap to clone via the shared handles; holds no
/// per-run state.
pub struct Pipeline {
    knowledge: Arc<KnowledgeStore>,
    chat: Arc<dyn ChatBackend>,
    evidence: Arc<dyn EvidenceSource>,
    config: PipelineConfig,
    progress: Arc<dyn PipelineProgress>,
}

impl Pipeline {
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        chat: Arc<dyn ChatBackend>,
        evidence: Arc<dyn EvidenceSource>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            knowledge,
            chat,
            evidence,
            config,
            progress: Arc::new(SilentProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn PipelineProgress>) -> Self {
        self.progress = progress;
        self
    }

    fn remaining(&self, started: Instant) -> Duration {
        Duration::from_secs(self.config.deadline_secs).saturating_sub(started.elapsed())
    }

    /// One LLM JSON call bounded by the run deadline.
    async fn chat_json_within(
        &self,
        started: Instant,
        system: &str,
        user: &str,
    ) -> Result<serde_json::Value> {
        let budget = self.remaining(started);
        if budget.is_zero() {
            return Err(BriefError::DeadlineExceeded {
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }
        match tokio::time::timeout(
            budget,
            self.chat.chat_json(system, user, &ChatOptions::default()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BriefError::DeadlineExceeded {
                elapsed_ms: started.elapsed().as_millis() as u64,
            }),
        }
    }

    /// Absorb one stage failure: record it, flag quota when applicable.
    fn absorb(ctx: &mut AnalysisContext, stage: Stage, error: &BriefError) {
        if matches!(error, BriefError::QuotaExceeded(_)) {
            ctx.evidence.quota_exceeded = true;
        }
        ctx.record_error(stage, error_code(error));
    }

    /// Run the full pipeline for one inquiry. Only input and config errors
    /// propagate; every other failure degrades the report in place.
    #[instrument(skip_all, fields(outlet = %outlet))]
    pub async fn generate_report(
        &self,
        outlet: &str,
        reporter: &str,
        issue_text: &str,
        mode: ReportMode,
    ) -> Result<RunOutcome> {
        let started = Instant::now();

        // Stage 1: validation. The only stage allowed to fail the run.
        self.progress.stage_started(Stage::Validate);
        let input = IssueInput::new(outlet, reporter, issue_text)?;
        let mut ctx = AnalysisContext::new(input, mode);

        self.initial_analysis(&mut ctx, started).await;
        self.map_knowledge(&mut ctx);
        self.gather_evidence(&mut ctx, started).await;
        self.fact_synthesis(&mut ctx, started).await;
        self.opinions_and_strategy(&mut ctx, started).await;

        // Stage 8: assembly plus archetype dispatch. Pure and synchronous.
        self.progress.stage_started(Stage::Assembly);
        let (report, archetype, crisis_level) =
            issuebrief_report::compose(&ctx, self.knowledge.skeleton(), Local::now());

        let summary = RunSummary {
            run_id: ctx.run_id.clone(),
            archetype,
            crisis_level,
            departments: ctx
                .departments
                .iter()
                .map(|m| m.department.name.clone())
                .collect(),
            used_default_departments: ctx.used_default_departments,
            outlet_known: ctx.outlet_known,
            evidence_count: ctx.evidence.items.len(),
            quota_exceeded: ctx.quota_exceeded(),
            stage_errors: ctx.stage_errors.clone(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            run_id = %summary.run_id,
            level = summary.crisis_level.as_u8(),
            errors = summary.stage_errors.len(),
            elapsed_ms = summary.elapsed_ms,
            "run finished"
        );
        self.progress.finished(&summary);

        Ok(RunOutcome { report, summary })
    }

    /// Stage 2: the LLM's first read of the issue.
    async fn initial_analysis(&self, ctx: &mut AnalysisContext, started: Instant) {
        self.progress.stage_started(Stage::InitialAnalysis);
        let (system, user) = prompts::initial_analysis(&ctx.input);
        let parsed = self
            .chat_json_within(started, &system, &user)
            .await
            .and_then(|value| {
                serde_json::from_value::<InitialAnalysis>(value)
                    .map_err(|e| BriefError::parse(format!("initial analysis: {e}")))
            });

        match parsed {
            Ok(analysis) => ctx.initial_analysis = Some(analysis),
            Err(e) => {
                Self::absorb(ctx, Stage::InitialAnalysis, &e);
                ctx.initial_analysis = Some(InitialAnalysis::fallback(&ctx.input.issue_text));
            }
        }
    }

    /// Stage 3: department ranking, crisis scoring, outlet lookup. Fully
    /// local; misses are documented in the context, never fatal.
    fn map_knowledge(&self, ctx: &mut AnalysisContext) {
        self.progress.stage_started(Stage::Mapping);

        let matches = self.knowledge.rank_departments(&ctx.input.issue_text);
        if matches.is_empty() {
            ctx.departments = self.knowledge.default_departments();
            ctx.used_default_departments = true;
        } else {
            ctx.departments = matches;
        }

        let (level, signals) = crisis::assess(&ctx.input.issue_text);
        ctx.raise_crisis_level(level);
        ctx.crisis_signals = signals;

        if let Some(outlet) = self.knowledge.lookup_outlet(&ctx.input.outlet) {
            ctx.outlet = outlet.clone();
            ctx.outlet_known = true;
        }
    }

    /// Stage 4: parallel evidence fan-out, bounded by both the search
    /// client's own deadline and the run deadline.
    async fn gather_evidence(&self, ctx: &mut AnalysisContext, started: Instant) {
        self.progress.stage_started(Stage::Evidence);
        let budget = self.remaining(started);
        if budget.is_zero() {
            Self::absorb(
                ctx,
                Stage::Evidence,
                &BriefError::DeadlineExceeded {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                },
            );
            return;
        }

        let search = self
            .evidence
            .search(&ctx.input.issue_text, self.config.evidence_limit);
        match tokio::time::timeout(budget, search).await {
            Ok(set) => {
                let quota_seen = ctx.evidence.quota_exceeded;
                ctx.evidence = set;
                ctx.evidence.quota_exceeded |= quota_seen;
            }
            Err(_) => Self::absorb(
                ctx,
                Stage::Evidence,
                &BriefError::DeadlineExceeded {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                },
            ),
        }
    }

    /// Stage 5: structured fact synthesis over the evidence.
    async fn fact_synthesis(&self, ctx: &mut AnalysisContext, started: Instant) {
        self.progress.stage_started(Stage::FactSynthesis);
        let analysis = ctx
            .initial_analysis
            .clone()
            .unwrap_or_else(|| InitialAnalysis::fallback(&ctx.input.issue_text));
        let (system, user) =
            prompts::fact_synthesis(&ctx.input.issue_text, &analysis, &ctx.evidence.items);

        let parsed = self
            .chat_json_within(started, &system, &user)
            .await
            .and_then(|value| {
                serde_json::from_value::<FactCheck>(value)
                    .map_err(|e| BriefError::parse(format!("fact synthesis: {e}")))
            });

        match parsed {
            Ok(fact) => ctx.fact_check = Some(fact),
            Err(e) => {
                Self::absorb(ctx, Stage::FactSynthesis, &e);
                ctx.fact_check = Some(FactCheck::fallback());
            }
        }
    }

    /// Stages 6 and 7: two independent LLM calls, run concurrently. The
    /// report is identical either way since neither reads the other's output.
    async fn opinions_and_strategy(&self, ctx: &mut AnalysisContext, started: Instant) {
        self.progress.stage_started(Stage::DeptOpinions);
        self.progress.stage_started(Stage::PrStrategy);

        let names: Vec<String> = ctx
            .departments
            .iter()
            .map(|m| m.department.name.clone())
            .collect();
        let fact = ctx.fact_check.clone().unwrap_or_else(FactCheck::fallback);

        let (op_system, op_user) = prompts::dept_opinions(&ctx.input.issue_text, &names);
        let (pr_system, pr_user) = prompts::pr_strategy(&ctx.input.issue_text, &fact);

        let (opinions, strategy) = tokio::join!(
            self.chat_json_within(started, &op_system, &op_user),
            self.chat_json_within(started, &pr_system, &pr_user),
        );

        match opinions {
            Ok(value) => ctx.dept_opinions = parse_opinions(&value, &names),
            Err(e) => {
                Self::absorb(ctx, Stage::DeptOpinions, &e);
                ctx.dept_opinions = names
                    .iter()
                    .map(|n| (n.clone(), DeptOpinion::fallback()))
                    .collect();
            }
        }

        let parsed_strategy = strategy.and_then(|value| {
            serde_json::from_value::<PrStrategy>(value)
                .map_err(|e| BriefError::parse(format!("pr strategy: {e}")))
        });
        match parsed_strategy {
            Ok(s) if !s.key_messages.is_empty() => ctx.pr_strategy = Some(s),
            Ok(_) => {
                Self::absorb(
                    ctx,
                    Stage::PrStrategy,
                    &BriefError::parse("pr strategy: empty key_messages"),
                );
                ctx.pr_strategy = Some(PrStrategy::fallback());
            }
            Err(e) => {
                Self::absorb(ctx, Stage::PrStrategy, &e);
                ctx.pr_strategy = Some(PrStrategy::fallback());
            }
        }
    }
}

/// Per-department parse of the batched opinion object. Departments the
/// model skipped or mangled get the canned fallback.
fn parse_opinions(value: &serde_json::Value, names: &[String]) -> Vec<(String, DeptOpinion)> {
    names
        .iter()
        .map(|name| {
            let opinion = value
                .get(name)
                .and_then(|v| serde_json::from_value::<DeptOpinion>(v.clone()).ok())
                .unwrap_or_else(DeptOpinion::fallback);
            (name.clone(), opinion)
        })
        .collect()
}
