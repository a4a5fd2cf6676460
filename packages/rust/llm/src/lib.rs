//! Chat-completion client for the issue report pipeline.
//!
//! [`ChatBackend`] is the seam between the orchestrator and the LLM;
//! production uses [`HttpChatClient`], tests substitute deterministic
//! stubs. The client is stateless: one request, one response, retries
//! internal and invisible to the caller.

pub mod cache;
pub mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use issuebrief_shared::{BriefError, LlmConfig, Result};

/// User-Agent string for outbound requests.
const USER_AGENT: &str = concat!("issuebrief/", env!("CARGO_PKG_VERSION"));

/// Maximum attempts per chat call.
const MAX_ATTEMPTS: u32 = 3;

/// Per-call sampling options.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 1_024,
        }
    }
}

// ---------------------------------------------------------------------------
// ChatBackend trait
// ---------------------------------------------------------------------------

/// Single-shot, stateless chat completion.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one system/user prompt pair and return the completion text.
    async fn chat(&self, system: &str, user: &str, options: &ChatOptions) -> Result<String>;

    /// Like [`chat`](Self::chat), but the raw body must be valid JSON.
    /// Malformed JSON is a parse error — the client never repairs it.
    async fn chat_json(
        &self,
        system: &str,
        user: &str,
        options: &ChatOptions,
    ) -> Result<serde_json::Value> {
        let raw = self.chat(system, user, options).await?;
        serde_json::from_str(raw.trim())
            .map_err(|e| BriefError::parse(format!("LLM returned invalid JSON: {e}")))
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Chat-completion client over `POST {endpoint}/chat/completions`.
pub struct HttpChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    backoff_base: Duration,
}

impl HttpChatClient {
    /// Build from config. The API key is resolved from the configured env
    /// var; an absent key leads to upstream auth failures that the
    /// orchestrator absorbs like any other.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| BriefError::config(format!("failed to build HTTP client: {e}")))?;

        let api_key = std::env::var(&config.api_key_env).unwrap_or_else(|_| {
            warn!(var = %config.api_key_env, "LLM API key not set");
            String::new()
        });

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        })
    }

    /// Model identifier, used for cache keying.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn attempt(&self, system: &str, user: &str, options: &ChatOptions) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BriefError::Upstream(format!("chat transport: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(BriefError::QuotaExceeded("chat completion quota".into()));
        }
        if status.is_server_error() {
            return Err(BriefError::Upstream(format!("chat: HTTP {status}")));
        }
        if !status.is_success() {
            // Remaining 4xx are caller faults on our side; retrying cannot help
            return Err(BriefError::UpstreamTerminal(format!("chat: HTTP {status}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| BriefError::Upstream(format!("chat body: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| BriefError::Upstream("chat: empty choices".into()))
    }

    /// Whether an error is worth another attempt: transport faults, 5xx,
    /// and 429. Other 4xx are terminal.
    fn retryable(error: &BriefError) -> bool {
        matches!(
            error,
            BriefError::QuotaExceeded(_) | BriefError::Upstream(_)
        )
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn chat(&self, system: &str, user: &str, options: &ChatOptions) -> Result<String> {
        let mut last_error = BriefError::Upstream("chat: no attempt made".into());

        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(system, user, options).await {
                Ok(content) => {
                    debug!(attempt, chars = content.len(), "chat completion ok");
                    return Ok(content);
                }
                Err(e) if Self::retryable(&e) && attempt < MAX_ATTEMPTS => {
                    let backoff = self.backoff_base * 2_u32.pow(attempt - 1);
                    warn!(attempt, error = %e, backoff_ms = backoff.as_millis() as u64, "chat attempt failed, retrying");
                    tokio::time::sleep(backoff).await;
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
