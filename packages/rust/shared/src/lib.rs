//! Shared types, error model, and configuration for the issue report pipeline.
//!
//! This crate is the foundation depended on by all other issuebrief crates.
//! It provides:
//! - [`BriefError`] — the unified error type
//! - Domain types ([`IssueInput`], [`AnalysisContext`], [`EvidenceItem`], [`CrisisLevel`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DataConfig, LlmConfig, NewsSearchConfig, PipelineConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_credentials,
};
pub use error::{BriefError, Result};
pub use types::{
    AnalysisContext, Archetype, CrisisLevel, CrisisRubricEntry, Department, DepartmentMatch,
    DeptOpinion, EvidenceItem, EvidenceSet, FactCheck, FactStatus, ImpactScope, InitialAnalysis,
    IssueCategory, IssueInput, MAX_ISSUE_CHARS, MIN_ISSUE_CHARS, Outlet, OutletReporter,
    PrStrategy, ReportMode, RunId, Scale, SourceKind, Stage, StageError, Tone,
};
