//! Streaming LLM backends.
//!
//! Enum dispatch over the two supported wire formats, both requested with
//! `"stream": true`. Responses arrive as server-sent events; each `data:`
//! line carries a JSON chunk from which a text delta is extracted. The
//! backend yields those deltas as a stream of strings and leaves parsing of
//! the judge's JSON reply to [`crate::parse`].

use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::config::{BackendConfig, BackendType};
use crate::error::JudgeError;
use crate::prompt::RenderedPrompt;

/// A stream of reply text deltas.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, JudgeError>> + Send>>;

/// Pulls the text delta out of one decoded SSE payload.
///
/// `Ok(None)` means the event carried no text (role headers, pings,
/// block boundaries).
type DeltaExtractor = fn(&serde_json::Value) -> Result<Option<String>, JudgeError>;

// ---------------------------------------------------------------------------
// Unified backend enum
// ---------------------------------------------------------------------------

/// An LLM backend that streams a reply to a rendered prompt.
///
/// Uses enum dispatch instead of trait objects because async methods
/// are not dyn-compatible.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    /// Send a prompt and return the stream of reply text deltas.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Backend`] if the request fails or the server
    /// answers with a non-success status. Errors during streaming arrive as
    /// items of the returned stream.
    pub async fn stream(&self, prompt: &RenderedPrompt) -> Result<TextStream, JudgeError> {
        match self {
            Self::OpenAi(backend) => backend.stream(prompt).await,
            Self::Anthropic(backend) => backend.stream(prompt).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Works with `OpenAI`, `DeepSeek`, and Ollama endpoints.
/// Sends requests to `{api_url}/chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    async fn stream(&self, prompt: &RenderedPrompt) -> Result<TextStream, JudgeError> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": 0.8,
            "max_tokens": self.max_tokens,
            "response_format": {"type": "json_object"},
            "stream": true
        });

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| JudgeError::Backend(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(JudgeError::Backend(format!(
                "OpenAI returned {status}: {error_body}"
            )));
        }

        Ok(sse_text_stream(response, extract_openai_delta))
    }
}

/// Extract the text delta from an `OpenAI` streaming chunk.
fn extract_openai_delta(json: &serde_json::Value) -> Result<Option<String>, JudgeError> {
    if let Some(error) = json.get("error") {
        return Err(JudgeError::Backend(format!("OpenAI stream error: {error}")));
    }
    Ok(json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned))
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// Uses `x-api-key` instead of a bearer token, takes the system prompt as a
/// top-level field, and streams typed events of which only
/// `content_block_delta` carries text.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    async fn stream(&self, prompt: &RenderedPrompt) -> Result<TextStream, JudgeError> {
        let url = format!("{}/messages", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": prompt.system,
            "messages": [
                {"role": "user", "content": prompt.user}
            ],
            "stream": true
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| JudgeError::Backend(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(JudgeError::Backend(format!(
                "Anthropic returned {status}: {error_body}"
            )));
        }

        Ok(sse_text_stream(response, extract_anthropic_delta))
    }
}

/// Extract the text delta from an Anthropic streaming event.
fn extract_anthropic_delta(json: &serde_json::Value) -> Result<Option<String>, JudgeError> {
    match json.get("type").and_then(serde_json::Value::as_str) {
        Some("content_block_delta") => Ok(json
            .get("delta")
            .filter(|d| d.get("type").and_then(serde_json::Value::as_str) == Some("text_delta"))
            .and_then(|d| d.get("text"))
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned)),
        Some("error") => {
            let message = json
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error");
            Err(JudgeError::Backend(format!(
                "Anthropic stream error: {message}"
            )))
        }
        _ => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Server-sent events
// ---------------------------------------------------------------------------

/// Turn a streaming HTTP response into a stream of text deltas.
///
/// Bytes are buffered across chunks so an event split between two network
/// reads, or a multi-byte character split the same way, is decoded whole.
fn sse_text_stream(response: reqwest::Response, extract: DeltaExtractor) -> TextStream {
    let stream = response
        .bytes_stream()
        .scan(Vec::new(), move |buffer: &mut Vec<u8>, chunk| {
            let deltas = match chunk {
                Ok(bytes) => {
                    buffer.extend_from_slice(&bytes);
                    parse_sse_events_buffered(buffer, extract)
                }
                Err(e) => vec![Err(JudgeError::Backend(format!("stream read failed: {e}")))],
            };
            futures::future::ready(Some(deltas))
        })
        .flat_map(futures::stream::iter);
    Box::pin(stream)
}

/// Consume every complete line in `buffer`, leaving a trailing partial line
/// for the next chunk, and return the text deltas found on `data:` lines.
fn parse_sse_events_buffered(
    buffer: &mut Vec<u8>,
    extract: DeltaExtractor,
) -> Vec<Result<String, JudgeError>> {
    let mut deltas = Vec::new();

    while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=newline).collect();
        let line = String::from_utf8_lossy(&line);
        let line = line.trim_end_matches(['\n', '\r']);

        // event:, id:, comments, and blank separators carry nothing we need
        let Some(payload) = line.strip_prefix("data:") else {
            continue;
        };
        let payload = payload.trim_start();
        if payload.is_empty() || payload == "[DONE]" {
            continue;
        }

        match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(json) => match extract(&json) {
                Ok(Some(text)) if !text.is_empty() => deltas.push(Ok(text)),
                Ok(_) => {}
                Err(e) => deltas.push(Err(e)),
            },
            Err(e) => deltas.push(Err(JudgeError::Parse(format!("SSE parse error: {e}")))),
        }
    }

    deltas
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM backend from configuration.
pub fn create_backend(config: &BackendConfig) -> LlmBackend {
    match config.backend_type {
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(config)),
        BackendType::Anthropic => LlmBackend::Anthropic(AnthropicBackend::new(config)),
    }
}
