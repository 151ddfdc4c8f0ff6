//! Configuration for the persuasion judge.
//!
//! Everything is loaded from environment variables so API keys never land in
//! the YAML file that sits next to the binary.

use std::time::Duration;

use crate::error::JudgeError;

/// Default judge call deadline in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Complete judge configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Which LLM to talk to.
    pub backend: BackendConfig,
    /// Deadline for one judge call, from request to final decision.
    pub request_timeout: Duration,
    /// Maximum number of judge calls streaming at once.
    pub max_concurrent_calls: usize,
    /// Path to the directory holding `judge_system.j2` and `judge_user.j2`.
    pub templates_dir: String,
}

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// The backend wire format.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication. Empty for local servers such as Ollama.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Upper bound on generated tokens per reply.
    pub max_tokens: u32,
}

/// Supported LLM backend wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions (`OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    /// Parse a backend name as written in `JUDGE_BACKEND`.
    pub fn parse(name: &str) -> Result<Self, JudgeError> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(JudgeError::Config(format!("unknown backend type: {other}"))),
        }
    }
}

impl JudgeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `JUDGE_BACKEND` -- backend type (`openai`, `deepseek`, `ollama`,
    ///   `anthropic`)
    /// - `JUDGE_API_URL` -- API base URL
    /// - `JUDGE_MODEL` -- model name
    ///
    /// Optional variables:
    /// - `JUDGE_API_KEY` -- API key (default empty)
    /// - `JUDGE_MAX_TOKENS` -- reply token cap (default 1024)
    /// - `JUDGE_TIMEOUT_MS` -- call deadline in milliseconds (default 30000)
    /// - `JUDGE_MAX_CONCURRENT_CALLS` -- parallel calls (default 8)
    /// - `JUDGE_TEMPLATES_DIR` -- prompt template directory (default `templates`)
    pub fn from_env() -> Result<Self, JudgeError> {
        let backend_type = BackendType::parse(&env_var("JUDGE_BACKEND")?)?;
        let api_url = env_var("JUDGE_API_URL")?;
        let model = env_var("JUDGE_MODEL")?;
        let api_key = std::env::var("JUDGE_API_KEY").unwrap_or_default();

        let max_tokens: u32 = std::env::var("JUDGE_MAX_TOKENS")
            .unwrap_or_else(|_| "1024".to_owned())
            .parse()
            .map_err(|e| JudgeError::Config(format!("invalid JUDGE_MAX_TOKENS: {e}")))?;

        let timeout_ms: u64 = std::env::var("JUDGE_TIMEOUT_MS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_MS.to_string())
            .parse()
            .map_err(|e| JudgeError::Config(format!("invalid JUDGE_TIMEOUT_MS: {e}")))?;

        let max_concurrent_calls: usize = std::env::var("JUDGE_MAX_CONCURRENT_CALLS")
            .unwrap_or_else(|_| "8".to_owned())
            .parse()
            .map_err(|e| JudgeError::Config(format!("invalid JUDGE_MAX_CONCURRENT_CALLS: {e}")))?;

        if max_concurrent_calls == 0 {
            return Err(JudgeError::Config(
                "JUDGE_MAX_CONCURRENT_CALLS must be at least 1".to_owned(),
            ));
        }

        let templates_dir =
            std::env::var("JUDGE_TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_owned());

        Ok(Self {
            backend: BackendConfig {
                backend_type,
                api_url: api_url.trim_end_matches('/').to_owned(),
                api_key,
                model,
                max_tokens,
            },
            request_timeout: Duration::from_millis(timeout_ms),
            max_concurrent_calls,
            templates_dir,
        })
    }
}

/// Read a required environment variable.
fn env_var(name: &str) -> Result<String, JudgeError> {
    std::env::var(name)
        .map_err(|e| JudgeError::Config(format!("missing required env var {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_type_parsing() {
        assert_eq!(BackendType::parse("openai").ok(), Some(BackendType::OpenAi));
        assert_eq!(BackendType::parse("Ollama").ok(), Some(BackendType::OpenAi));
        assert_eq!(BackendType::parse("deepseek").ok(), Some(BackendType::OpenAi));
        assert_eq!(
            BackendType::parse(" claude ").ok(),
            Some(BackendType::Anthropic)
        );
        assert!(BackendType::parse("gemini").is_err());
    }

    #[test]
    fn timeout_default_is_thirty_seconds() {
        assert_eq!(
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
            Duration::from_secs(30)
        );
    }
}
