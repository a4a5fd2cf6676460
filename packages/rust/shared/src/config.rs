//! Application configuration for the issue report pipeline.
//!
//! User config lives at `~/.issuebrief/issuebrief.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored in the file — only the names of the
//! environment variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BriefError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "issuebrief.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".issuebrief";

// ---------------------------------------------------------------------------
// Config structs (matching issuebrief.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reference data location.
    #[serde(default)]
    pub data: DataConfig,

    /// LLM chat-completion settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// News-search API settings.
    #[serde(default)]
    pub news_search: NewsSearchConfig,

    /// Pipeline timing and limits.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// `[data]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding `reference.json` and `report_skeleton.txt`.
    #[serde(default = "default_data_dir")]
    pub dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data".into()
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    /// Chat-completion endpoint base URL (the `/chat/completions` path is
    /// appended by the client).
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with each request.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Base backoff in milliseconds for the retry schedule.
    #[serde(default = "default_backoff_ms")]
    pub backoff_base_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_llm_key_env(),
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            backoff_base_ms: default_backoff_ms(),
        }
    }
}

fn default_llm_key_env() -> String {
    "ISSUEBRIEF_LLM_API_KEY".into()
}
fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".into()
}
fn default_backoff_ms() -> u64 {
    1_000
}

/// `[news_search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSearchConfig {
    /// Name of the env var holding the client id.
    #[serde(default = "default_news_id_env")]
    pub client_id_env: String,

    /// Name of the env var holding the client secret.
    #[serde(default = "default_news_secret_env")]
    pub client_secret_env: String,

    /// News-search endpoint (`GET {endpoint}?query=...&display=...&sort=...`).
    #[serde(default = "default_news_endpoint")]
    pub endpoint: String,
}

impl Default for NewsSearchConfig {
    fn default() -> Self {
        Self {
            client_id_env: default_news_id_env(),
            client_secret_env: default_news_secret_env(),
            endpoint: default_news_endpoint(),
        }
    }
}

fn default_news_id_env() -> String {
    "ISSUEBRIEF_NEWS_CLIENT_ID".into()
}
fn default_news_secret_env() -> String {
    "ISSUEBRIEF_NEWS_CLIENT_SECRET".into()
}
fn default_news_endpoint() -> String {
    "https://openapi.naver.com/v1/search/news.json".into()
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Run-level deadline in seconds.
    #[serde(default = "default_run_deadline")]
    pub deadline_secs: u64,

    /// Overall evidence-gathering deadline in seconds.
    #[serde(default = "default_search_deadline")]
    pub search_deadline_secs: u64,

    /// Per-source query timeout in seconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// Maximum evidence items kept per run.
    #[serde(default = "default_evidence_limit")]
    pub evidence_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_run_deadline(),
            search_deadline_secs: default_search_deadline(),
            query_timeout_secs: default_query_timeout(),
            evidence_limit: default_evidence_limit(),
        }
    }
}

fn default_run_deadline() -> u64 {
    90
}
fn default_search_deadline() -> u64 {
    30
}
fn default_query_timeout() -> u64 {
    15
}
fn default_evidence_limit() -> usize {
    10
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.issuebrief/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BriefError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.issuebrief/issuebrief.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BriefError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| BriefError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BriefError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BriefError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BriefError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that both credential env vars are set and non-empty.
pub fn validate_credentials(config: &AppConfig) -> Result<()> {
    require_env(&config.llm.api_key_env, "LLM API key")?;
    require_env(&config.news_search.client_id_env, "news-search client id")?;
    require_env(
        &config.news_search.client_secret_env,
        "news-search client secret",
    )?;
    Ok(())
}

fn require_env(var_name: &str, what: &str) -> Result<()> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(BriefError::config(format!(
            "{what} not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("ISSUEBRIEF_LLM_API_KEY"));
        assert!(toml_str.contains("deadline_secs"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.pipeline.deadline_secs, 90);
        assert_eq!(parsed.pipeline.search_deadline_secs, 30);
        assert_eq!(parsed.pipeline.query_timeout_secs, 15);
        assert_eq!(parsed.data.dir, "data");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[llm]
model = "gpt-4o"

[pipeline]
deadline_secs = 45
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.backoff_base_ms, 1_000);
        assert_eq!(config.pipeline.deadline_secs, 45);
        assert_eq!(config.pipeline.search_deadline_secs, 30);
    }

    #[test]
    fn credential_validation_fails_without_env() {
        let mut config = AppConfig::default();
        // Unique env var names to avoid interfering with other tests
        config.llm.api_key_env = "IB_TEST_NONEXISTENT_KEY_98765".into();
        let result = validate_credentials(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }
}
