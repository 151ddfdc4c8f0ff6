//! Judge reply parsing: best-effort partials while streaming, strict at the end.
//!
//! The judge streams one JSON object shaped like
//! `{"thinking": [..], "result": {"message": "..", "newTarget": 7}}`.
//! While text is still arriving the buffer is an unterminated prefix of that
//! object. [`parse_partial`] closes it just enough to read what is there;
//! [`parse_final`] runs the full recovery chain on the finished buffer.

use herding_types::{JudgeDecision, PendingResponse, WaypointId};

use crate::error::JudgeError;

/// Intermediate struct for the judge's raw JSON reply.
#[derive(Debug, Default, serde::Deserialize)]
struct RawJudgement {
    #[serde(default)]
    thinking: Vec<String>,
    #[serde(default)]
    result: Option<RawResult>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct RawResult {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "newTarget")]
    new_target: Option<WaypointId>,
}

impl RawJudgement {
    fn into_pending(self) -> PendingResponse {
        let (message, new_target) = self
            .result
            .map(|r| (r.message.unwrap_or_default(), r.new_target))
            .unwrap_or_default();

        if !message.trim().is_empty() {
            PendingResponse::Complete {
                message,
                new_target,
                trace: self.thinking,
            }
        } else if self.thinking.is_empty() {
            PendingResponse::Empty
        } else {
            PendingResponse::Thinking {
                trace: self.thinking,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Partial parsing
// ---------------------------------------------------------------------------

/// Read whatever is usable out of a partially streamed reply.
///
/// Returns [`PendingResponse::Empty`] when nothing can be read yet.
pub fn parse_partial(buffer: &str) -> PendingResponse {
    let Some(start) = buffer.find('{') else {
        return PendingResponse::Empty;
    };
    let Some(text) = buffer.get(start..) else {
        return PendingResponse::Empty;
    };

    if let Some(raw) = close_and_parse(text) {
        return raw.into_pending();
    }

    // The tail is a half-written key or literal. Back off to each earlier
    // structural boundary until the prefix closes cleanly.
    for cut in cut_points(text).into_iter().rev() {
        if let Some(raw) = text.get(..cut).and_then(close_and_parse) {
            return raw.into_pending();
        }
    }

    PendingResponse::Empty
}

fn close_and_parse(prefix: &str) -> Option<RawJudgement> {
    serde_json::from_str(&close_json(prefix)).ok()
}

/// Append whatever closes an unterminated JSON prefix: an open string, then
/// every open array and object in reverse order.
fn close_json(prefix: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in prefix.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut closed = prefix.to_owned();
    if in_string {
        if escaped {
            closed.pop();
        }
        closed.push('"');
    } else {
        closed.truncate(closed.trim_end().len());
    }
    while let Some(closer) = stack.pop() {
        closed.push(closer);
    }
    closed
}

/// Byte offsets where a prefix can be cut to drop an incomplete member:
/// at each comma, and just after each opening brace or bracket, outside
/// strings.
fn cut_points(text: &str) -> Vec<usize> {
    let mut points = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ',' => points.push(i),
            '{' | '[' => points.push(i.saturating_add(1)),
            _ => {}
        }
    }
    points
}

// ---------------------------------------------------------------------------
// Final parsing
// ---------------------------------------------------------------------------

/// Parse a finished reply into a [`JudgeDecision`].
///
/// Attempts multiple recovery strategies if the raw text is not clean JSON:
/// 1. Direct `serde_json` deserialization
/// 2. Extract JSON from a markdown code block
/// 3. Strip trailing commas and retry
/// 4. Code block extraction, then comma stripping
///
/// A reply without a non-empty `result.message` is an error.
pub fn parse_final(raw: &str) -> Result<JudgeDecision, JudgeError> {
    let raw = try_parse(raw)?;
    let Some(result) = raw.result else {
        return Err(JudgeError::Parse("judge reply has no result".to_owned()));
    };
    let message = result.message.unwrap_or_default().trim().to_owned();
    if message.is_empty() {
        return Err(JudgeError::Parse("judge reply has an empty message".to_owned()));
    }
    Ok(JudgeDecision {
        message,
        new_target: result.new_target,
        thinking: raw.thinking,
    })
}

/// Attempt to parse the reply through multiple recovery strategies.
fn try_parse(raw: &str) -> Result<RawJudgement, JudgeError> {
    let trimmed = raw.trim();

    // Strategy 1: direct parse
    if let Ok(parsed) = serde_json::from_str::<RawJudgement>(trimmed) {
        return Ok(parsed);
    }

    // Strategy 2: extract from markdown code block
    if let Some(json_str) = extract_json_from_codeblock(trimmed)
        && let Ok(parsed) = serde_json::from_str::<RawJudgement>(json_str)
    {
        return Ok(parsed);
    }

    // Strategy 3: strip trailing commas and retry
    let cleaned = strip_trailing_commas(trimmed);
    if let Ok(parsed) = serde_json::from_str::<RawJudgement>(&cleaned) {
        return Ok(parsed);
    }

    // Strategy 4: extract from code block then strip commas
    if let Some(json_str) = extract_json_from_codeblock(trimmed) {
        let cleaned_inner = strip_trailing_commas(json_str);
        if let Ok(parsed) = serde_json::from_str::<RawJudgement>(&cleaned_inner) {
            return Ok(parsed);
        }
    }

    Err(JudgeError::Parse(format!(
        "all parse strategies failed for: {trimmed}"
    )))
}

/// Extract the body of the first fenced code block, with or without a
/// `json` tag.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = text.get(fence.checked_add(3)?..)?;
    let body_start = after_fence.find('\n').and_then(|nl| nl.checked_add(1))?;
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// Strip trailing commas before closing braces and brackets.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            result.push(c);
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let rest = chars.clone().find(|n| !n.is_whitespace());
            if matches!(rest, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }

    result
}
