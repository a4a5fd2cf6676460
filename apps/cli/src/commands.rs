//! CLI surface: argument parsing and command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};

use issuebrief_core::{Pipeline, PipelineProgress, RunSummary};
use issuebrief_knowledge::KnowledgeStore;
use issuebrief_llm::HttpChatClient;
use issuebrief_llm::cache::{CachedChat, MemoryCache};
use issuebrief_search::SearchClient;
use issuebrief_shared::{
    ReportMode, Stage, config_file_path, init_config, load_config, validate_credentials,
};

#[derive(Parser)]
#[command(
    name = "issuebrief",
    version,
    about = "언론 문의를 구조화된 이슈 발생 보고로 변환합니다"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a report for one press inquiry
    Report {
        /// Media outlet name (e.g. 조선일보)
        #[arg(long)]
        outlet: String,

        /// Reporter name
        #[arg(long)]
        reporter: String,

        /// Inquiry text, 20-2000 characters
        #[arg(long)]
        issue: String,

        /// Pipeline mode: standard | enhanced
        #[arg(long, default_value = "enhanced")]
        mode: String,

        /// Reference-data directory, overriding the configured one
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Look up media outlets in the reference data
    Outlets {
        /// Outlet name or fragment; lists all when omitted
        query: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a default config file if none exists
    Init,
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
}

// ---------------------------------------------------------------------------
// Progress spinner
// ---------------------------------------------------------------------------

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Validate => "입력 검증",
        Stage::InitialAnalysis => "이슈 초기 분석",
        Stage::Mapping => "유관 부서·위기 단계 매핑",
        Stage::Evidence => "외부 근거 수집",
        Stage::FactSynthesis => "사실 관계 정리",
        Stage::DeptOpinions => "부서 의견 취합",
        Stage::PrStrategy => "대응 전략 수립",
        Stage::Assembly => "보고서 작성",
    }
}

struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        Self { spinner }
    }
}

impl PipelineProgress for CliProgress {
    fn stage_started(&self, stage: Stage) {
        self.spinner.set_message(stage_label(stage));
    }

    fn finished(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn run_report(
    outlet: String,
    reporter: String,
    issue: String,
    mode: String,
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mode: ReportMode = mode.parse()?;
    let config = load_config()?;
    validate_credentials(&config)?;

    let data_dir = data_dir.unwrap_or_else(|| PathBuf::from(&config.data.dir));
    let knowledge = Arc::new(KnowledgeStore::load(&data_dir)?);

    let chat_client = HttpChatClient::new(&config.llm)?;
    let model = chat_client.model().to_string();
    let chat = Arc::new(CachedChat::new(chat_client, MemoryCache::new(), model));

    let search = Arc::new(SearchClient::new(&config.news_search, &config.pipeline)?);

    let pipeline = Pipeline::new(knowledge, chat, search, config.pipeline.clone())
        .with_progress(Arc::new(CliProgress::new()));

    let outcome = pipeline
        .generate_report(&outlet, &reporter, &issue, mode)
        .await?;

    match output {
        Some(path) => {
            std::fs::write(&path, &outcome.report)?;
            println!("보고서 저장: {}", path.display());
        }
        None => println!("{}", outcome.report),
    }

    let summary = &outcome.summary;
    eprintln!();
    eprintln!("run {}", summary.run_id);
    eprintln!(
        "  위기 단계 {} · 유관 부서 {} · 근거 {}건 · {}ms",
        summary.crisis_level,
        summary.departments.join(", "),
        summary.evidence_count,
        summary.elapsed_ms
    );
    if summary.quota_exceeded {
        eprintln!("  외부 수집 쿼터 제한이 있었습니다");
    }
    for error in &summary.stage_errors {
        eprintln!("  흡수된 오류: {} ({})", error.stage.as_str(), error.code);
    }

    Ok(())
}

pub fn run_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = init_config()?;
            println!("설정 파일 생성: {}", path.display());
        }
        ConfigAction::Show => {
            let config = load_config()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", config_file_path()?.display());
        }
    }
    Ok(())
}

pub fn run_outlets(query: Option<String>) -> Result<()> {
    let config = load_config()?;
    let knowledge = KnowledgeStore::load(Path::new(&config.data.dir))?;

    match query {
        Some(name) => {
            let outlet = knowledge
                .lookup_outlet(&name)
                .ok_or_else(|| eyre!("등록되지 않은 매체: {name}"))?;
            println!("{} ({})", outlet.name, outlet.category);
            if !outlet.main_phone.is_empty() {
                println!("  대표전화 {}", outlet.main_phone);
            }
            for desk in &outlet.desk {
                println!("  데스크 {desk}");
            }
            for reporter in &outlet.reporters {
                let mut line = format!("  기자 {}", reporter.name);
                if !reporter.role.is_empty() {
                    line.push_str(&format!(" · {}", reporter.role));
                }
                if !reporter.phone.is_empty() {
                    line.push_str(&format!(" · {}", reporter.phone));
                }
                println!("{line}");
            }
        }
        None => {
            for outlet in knowledge.outlets() {
                println!("{} ({})", outlet.name, outlet.category);
            }
        }
    }
    Ok(())
}
