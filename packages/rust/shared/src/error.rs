//! Error types for the issue report pipeline.
//!
//! Library crates use [`BriefError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Only [`BriefError::Input`] and [`BriefError::Config`] ever reach the
//! caller of the pipeline; everything else is absorbed stage-locally and
//! recorded in the run summary.

use std::path::PathBuf;

/// Top-level error type for all pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum BriefError {
    /// Caller fault: empty or out-of-bounds input fields. Surfaced.
    #[error("input error: {message}")]
    Input { message: String },

    /// Startup fault: missing/invalid reference data or credentials. Surfaced.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transient remote failure (transport, HTTP 5xx). Absorbed with fallback.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Remote rejection that retrying cannot help (HTTP 4xx other than 429).
    /// Absorbed with fallback.
    #[error("upstream rejection: {0}")]
    UpstreamTerminal(String),

    /// LLM returned non-conformant JSON. Absorbed with stage defaults.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Remote quota exhausted (HTTP 429). Absorbed; flagged in the context.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Run-level deadline hit. Absorbed; remaining sections get placeholders.
    #[error("deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BriefError>;

impl BriefError {
    /// Create an input error from any displayable message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error may propagate out of `generate_report`.
    pub fn is_surfaced(&self) -> bool {
        matches!(self, Self::Input { .. } | Self::Config { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = BriefError::input("issue text too short");
        assert_eq!(err.to_string(), "input error: issue text too short");

        let err = BriefError::config("reference data missing `departments`");
        assert!(err.to_string().contains("departments"));
    }

    #[test]
    fn only_input_and_config_surface() {
        assert!(BriefError::input("x").is_surfaced());
        assert!(BriefError::config("x").is_surfaced());
        assert!(!BriefError::Upstream("x".into()).is_surfaced());
        assert!(!BriefError::UpstreamTerminal("x".into()).is_surfaced());
        assert!(!BriefError::parse("x").is_surfaced());
        assert!(!BriefError::QuotaExceeded("x".into()).is_surfaced());
        assert!(!BriefError::DeadlineExceeded { elapsed_ms: 90_000 }.is_surfaced());
    }
}
