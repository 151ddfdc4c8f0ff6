//! Error types for the persuasion judge.
//!
//! None of these reach the player. The dispatcher turns every one of them
//! into a [`herding_types::JudgeUpdate::Failed`] and the simulation falls
//! back to a canned reply.

/// Errors that can occur while judging a conversation turn.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    /// Failed to load or render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// The LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    Backend(String),

    /// The streamed reply could not be parsed into a decision.
    #[error("response parse error: {0}")]
    Parse(String),

    /// The call exceeded the configured deadline.
    #[error("timeout: judge call exceeded deadline")]
    Timeout,

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
